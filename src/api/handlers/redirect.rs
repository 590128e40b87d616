//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header::LOCATION},
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short key to its original URL.
///
/// # Endpoint
///
/// `GET /{key}`
///
/// # Response Codes
///
/// - **307 Temporary Redirect**: `Location` holds the original URL
/// - **404 Not Found**: unknown key
/// - **410 Gone**: the URL was deleted by its owner
///
/// # Errors
///
/// Returns 500 if the stored URL cannot be sent as a header value.
pub async fn redirect_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, [(axum::http::HeaderName, HeaderValue); 1]), AppError> {
    let original_url = state.url_service.get_url(&key).await?;

    let location = HeaderValue::from_str(&original_url).map_err(|_| {
        AppError::internal(
            "Stored URL is not a valid Location header",
            json!({ "short_key": key }),
        )
    })?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]))
}
