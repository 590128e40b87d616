//! Handler for the storage health check.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Checks that storage responds.
///
/// # Endpoint
///
/// `GET /ping`
///
/// # Response Codes
///
/// - **200 OK**: storage answered
/// - **500 Internal Server Error**: storage is unreachable or timed out
pub async fn ping_handler(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.url_service.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Storage ping failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
        }
    }
}
