//! REST API endpoints for the verification relay.

use axum::routing::{get, post};
use axum::Router;

use crate::server::AppState;

use super::handlers::{
    contract_info, health_check, verify_custom, verify_default, verify_inline,
};

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/verify", post(verify_default))
        .route("/verify/custom", post(verify_custom))
        .route("/verify/inline", post(verify_inline))
        .route("/verify/contract-info", get(contract_info))
}
