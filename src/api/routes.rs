//! API route configuration.

use crate::api::handlers::{
    delete_user_urls_handler, list_user_urls_handler, shorten_batch_handler, shorten_handler,
};
use crate::state::AppState;
use axum::{Router, routing::{get, post}};

/// JSON API routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /shorten`       - Shorten one URL
/// - `POST   /shorten/batch` - Shorten several URLs, all or nothing
/// - `GET    /user/urls`     - URLs of the requesting user
/// - `DELETE /user/urls`     - Queue deletion of the requesting user's URLs
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/shorten/batch", post(shorten_batch_handler))
        .route(
            "/user/urls",
            get(list_user_urls_handler).delete(delete_user_urls_handler),
        )
}
