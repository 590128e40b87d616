//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::UrlService;
use crate::domain::repositories::UrlRepository;
use crate::utils::identity::IdentitySigner;

/// Application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService<dyn UrlRepository>>,
    pub signer: Arc<IdentitySigner>,
}

impl AppState {
    pub fn new(url_service: Arc<UrlService<dyn UrlRepository>>, signer: IdentitySigner) -> Self {
        Self {
            url_service,
            signer: Arc::new(signer),
        }
    }
}
