//! Structured API error responses with error codes
//!
//! Every failure leaves the API as
//! `{ success: false, error, message, details?, code, numericCode }`
//! with the code repeated in the `x-error-code` header.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infra::RelayError;
use crate::report::Reporter;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// Required field is missing
    MissingRequiredField,
    /// Field value is invalid
    InvalidFieldValue,

    // Resource errors (4xxx)
    /// No route matches the request
    RouteNotFound,
    /// A proof artifact file does not exist
    ArtifactNotFound,

    // Verification errors (6xxx)
    /// Calldata generation or the on-chain call failed
    VerificationFailed,

    // Infrastructure errors (8xxx)
    /// No default artifacts were configured for `POST /api/verify`
    ArtifactsNotConfigured,
    /// External service unavailable
    ServiceUnavailable,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::MissingRequiredField => 3002,
            ErrorCode::InvalidFieldValue => 3003,

            ErrorCode::RouteNotFound => 4001,
            ErrorCode::ArtifactNotFound => 4002,

            ErrorCode::VerificationFailed => 6001,

            ErrorCode::ArtifactsNotConfigured => 8001,
            ErrorCode::ServiceUnavailable => 8002,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequestBody
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::ArtifactNotFound => StatusCode::BAD_REQUEST,

            ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,

            ErrorCode::ArtifactsNotConfigured | ErrorCode::ServiceUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::VerificationFailed | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::RouteNotFound => "ROUTE_NOT_FOUND",
            ErrorCode::ArtifactNotFound => "ARTIFACT_NOT_FOUND",
            ErrorCode::VerificationFailed => "VERIFICATION_FAILED",
            ErrorCode::ArtifactsNotConfigured => "ARTIFACTS_NOT_CONFIGURED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Always `false`
    pub success: bool,

    /// Short error title
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Cause chain, omitted in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            details: None,
            code,
            numeric_code: code.numeric_code(),
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Map a relay failure, translating the message for end users.
    pub fn from_relay(err: &RelayError, reporter: &Reporter) -> Self {
        let code = match err {
            RelayError::MissingArtifact { .. } => ErrorCode::ArtifactNotFound,
            RelayError::InvalidPayload(_) => ErrorCode::InvalidFieldValue,
            RelayError::Configuration(_) => ErrorCode::InternalError,
            _ => ErrorCode::VerificationFailed,
        };
        let report = reporter.report_error(err);
        ApiError::new(code, "Falha na verificação da prova", report.message)
            .with_details(report.details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            ErrorCode::InvalidRequestBody,
            "Corpo da requisição inválido",
            rejection.body_text(),
        )
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Required request fields are absent or empty
pub fn missing_fields(message: impl Into<String>) -> ApiError {
    ApiError::new(
        ErrorCode::MissingRequiredField,
        "Parâmetros obrigatórios ausentes",
        message,
    )
}

/// A field is present but unusable
pub fn invalid_field(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(
        ErrorCode::InvalidFieldValue,
        format!("Campo inválido: {field}"),
        message,
    )
}

/// Fallback for unmatched routes
pub fn route_not_found(method: &str, uri: &str) -> ApiError {
    ApiError::new(
        ErrorCode::RouteNotFound,
        "Rota não encontrada",
        format!("A rota {method} {uri} não existe"),
    )
}

// ============================================================================
// Tests
// ============================================================================
