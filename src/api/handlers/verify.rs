//! Proof verification handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{error, info, instrument, warn};

use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{
    ContractInfoResponse, CustomVerifyRequest, InlineVerifyRequest, VerifyResponse,
};
use crate::domain::{ArtifactPaths, VerificationRequest};
use crate::server::AppState;

/// `POST /api/verify`: verify the server-configured artifacts.
#[instrument(skip_all)]
pub async fn verify_default(
    State(state): State<AppState>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let paths = state.default_artifacts.clone().ok_or_else(|| {
        ApiError::new(
            ErrorCode::ArtifactsNotConfigured,
            "Artefatos de prova não configurados",
            "Defina ZK_ARTIFACTS_DIR ou ZK_PROOF_PATH, ZK_VK_PATH e ZK_PUBLIC_INPUTS_PATH",
        )
    })?;
    run(&state, VerificationRequest::Paths(paths)).await
}

/// `POST /api/verify/custom`: verify artifacts at caller-supplied paths.
#[instrument(skip_all)]
pub async fn verify_custom(
    State(state): State<AppState>,
    payload: Result<Json<CustomVerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let paths: ArtifactPaths = body_or_default(payload)?.into_paths()?;
    info!(proof = %paths.proof_path.display(), "custom verification requested");
    run(&state, VerificationRequest::Paths(paths)).await
}

/// `POST /api/verify/inline`: verify base64-encoded artifacts.
#[instrument(skip_all)]
pub async fn verify_inline(
    State(state): State<AppState>,
    payload: Result<Json<InlineVerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let artifacts = body_or_default(payload)?.into_artifacts()?;
    info!(proof_bytes = artifacts.proof.len(), "inline verification requested");
    run(&state, VerificationRequest::Inline(artifacts)).await
}

/// `GET /api/verify/contract-info`
pub async fn contract_info(State(state): State<AppState>) -> Json<ContractInfoResponse> {
    Json(ContractInfoResponse {
        success: true,
        contract: state.starknet.contract_info(),
    })
}

async fn run(
    state: &AppState,
    request: VerificationRequest,
) -> Result<Json<VerifyResponse>, ApiError> {
    match state.relay.verify_request(request).await {
        Ok(result) => {
            let report = state.reporter.report_result(&result);
            Ok(Json(VerifyResponse {
                success: report.success,
                message: report.message,
                result,
            }))
        }
        Err(e) => {
            if e.is_input_error() {
                warn!(error = %e, "verification request rejected");
            } else {
                error!(error = %e, category = ?e.category(), "verification failed");
            }
            Err(ApiError::from_relay(&e, &state.reporter))
        }
    }
}

/// A request without a JSON body is treated as an empty object, so that
/// missing fields are reported as such.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}
