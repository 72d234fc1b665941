//! Health check handlers
//!
//! `/api/health` is pure liveness and never touches the network;
//! `/ready` asks the configured node for its chain id.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{HealthResponse, HealthServices};
use crate::domain::parse_field_element;
use crate::server::AppState;

/// Service version reported by health and banner endpoints.
pub const VERSION: &str = "1.0.0";

/// Basic health check, no dependencies checked.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let starknet = if state.starknet.rpc_url_configured {
        "configured"
    } else {
        "not configured"
    };

    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.reporter.environment().name().to_string(),
        version: VERSION,
        services: HealthServices {
            api: "healthy",
            starknet,
        },
    })
}

/// Readiness: the node answers and is on the configured chain.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = std::time::Instant::now();
    let reported = state.relay.chain_id().await.map_err(|e| {
        warn!(error = %e, "readiness check failed");
        ApiError::new(
            ErrorCode::ServiceUnavailable,
            "Rede Starknet indisponível",
            e.to_string(),
        )
    })?;

    if !same_chain(&reported, &state.starknet.chain_id) {
        return Err(ApiError::new(
            ErrorCode::ServiceUnavailable,
            "Rede Starknet incorreta",
            format!(
                "o nó RPC está na rede {reported}, esperado {}",
                state.starknet.chain_id
            ),
        ));
    }

    Ok(Json(json!({
        "status": "ready",
        "starknet": {
            "chainId": reported,
            "responseTimeMs": start.elapsed().as_millis() as u64,
        },
    })))
}

fn same_chain(a: &str, b: &str) -> bool {
    match (parse_field_element(a), parse_field_element(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
