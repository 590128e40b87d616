//! Handlers for the requesting user's URLs.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::user_urls::UserUrlItem;
use crate::api::middleware::identity::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the URLs shortened by the requesting user.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// # Response
///
/// 200 OK with the active URLs in creation order, or 204 No Content when
/// the user has none.
///
/// ```json
/// [
///   { "short_url": "http://localhost:8080/6QJ2ZK8XNR", "original_url": "https://example.com" }
/// ]
/// ```
pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
) -> Result<Response, AppError> {
    let urls = state.url_service.list_by_owner(&owner).await?;

    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let items: Vec<UserUrlItem> = urls
        .into_iter()
        .map(|url| UserUrlItem {
            short_url: state.url_service.short_url(&url.short_key),
            original_url: url.original_url,
        })
        .collect();

    Ok(Json(items).into_response())
}

/// Schedules deletion of the requesting user's URLs.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// # Request Body
///
/// ```json
/// ["6QJ2ZK8XNR", "T4M9WB3HCP"]
/// ```
///
/// Returns 202 Accepted once the keys are queued. Deletion happens in the
/// background; keys owned by someone else are ignored.
///
/// # Errors
///
/// Returns 503 Service Unavailable if the deletion pool is shutting down.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(keys): Json<Vec<String>>,
) -> Result<StatusCode, AppError> {
    let queued = state.url_service.delete_urls(&owner, keys)?;
    tracing::debug!("Queued {} deletions for {}", queued, owner);

    Ok(StatusCode::ACCEPTED)
}
