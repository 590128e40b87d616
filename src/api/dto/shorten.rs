//! DTOs for the shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{BatchItem, BatchResult};

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,
}

/// Short URL for a single shortening request, new or pre-existing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One entry of `POST /api/shorten/batch`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchRequestItem {
    pub correlation_id: String,

    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub original_url: String,
}

impl From<BatchRequestItem> for BatchItem {
    fn from(item: BatchRequestItem) -> Self {
        Self {
            correlation_id: item.correlation_id,
            original_url: item.original_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}

impl BatchResponseItem {
    pub fn new(result: BatchResult, short_url: String) -> Self {
        Self {
            correlation_id: result.correlation_id,
            short_url,
        }
    }
}
