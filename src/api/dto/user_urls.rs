//! DTOs for the per-user URL endpoints.

use serde::{Deserialize, Serialize};

/// A URL created by the requesting user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserUrlItem {
    pub short_url: String,
    pub original_url: String,
}
