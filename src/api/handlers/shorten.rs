//! Handlers for the shortening endpoints.

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{
    BatchRequestItem, BatchResponseItem, ShortenRequest, ShortenResponse,
};
use crate::api::middleware::identity::Owner;
use crate::application::services::{BatchItem, SaveOutcome};
use crate::error::AppError;
use crate::state::AppState;

fn outcome_status(outcome: &SaveOutcome) -> StatusCode {
    if outcome.is_existing() {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

/// Shortens a URL sent as the raw request body.
///
/// # Endpoint
///
/// `POST /`
///
/// # Response
///
/// The short URL as `text/plain`:
///
/// - **201 Created**: a new short URL
/// - **409 Conflict**: the URL was already shortened; body is the existing short URL
///
/// # Errors
///
/// Returns 400 Bad Request for an empty body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    body: String,
) -> Result<Response, AppError> {
    let outcome = state.url_service.save_url(&body, &owner).await?;
    let short_url = state.url_service.short_url(outcome.short_key());

    Ok((
        outcome_status(&outcome),
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        short_url,
    )
        .into_response())
}

/// Shortens a single URL given as JSON.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// ```json
/// { "result": "http://localhost:8080/6QJ2ZK8XNR" }
/// ```
///
/// Status is 201 for a new short URL and 409 when the URL was already shortened.
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let outcome = state.url_service.save_url(&payload.url, &owner).await?;
    let result = state.url_service.short_url(outcome.short_key());

    Ok((outcome_status(&outcome), Json(ShortenResponse { result })))
}

/// Shortens several URLs in one request.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [
///   { "correlation_id": "a1", "original_url": "https://example.com/1" },
///   { "correlation_id": "a2", "original_url": "https://example.com/2" }
/// ]
/// ```
///
/// # Response
///
/// 201 Created, in request order:
///
/// ```json
/// [
///   { "correlation_id": "a1", "short_url": "http://localhost:8080/6QJ2ZK8XNR" },
///   { "correlation_id": "a2", "short_url": "http://localhost:8080/T4M9WB3HCP" }
/// ]
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for an empty batch or an empty URL, and
/// 409 Conflict if any URL is already shortened (nothing is stored).
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(payload): Json<Vec<BatchRequestItem>>,
) -> Result<(StatusCode, Json<Vec<BatchResponseItem>>), AppError> {
    if payload.is_empty() {
        return Err(AppError::bad_request(
            "Batch must not be empty",
            json!({ "items": 0 }),
        ));
    }

    for item in &payload {
        item.validate()?;
    }

    let items: Vec<BatchItem> = payload.into_iter().map(BatchItem::from).collect();
    let results = state.url_service.save_batch(items, &owner).await?;

    let response = results
        .into_iter()
        .map(|result| {
            let short_url = state.url_service.short_url(&result.short_key);
            BatchResponseItem::new(result, short_url)
        })
        .collect();

    Ok((StatusCode::CREATED, Json(response)))
}
