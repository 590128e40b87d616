#![allow(dead_code)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use std::sync::Arc;
use std::time::Duration;
use url_shortener::application::services::UrlService;
use url_shortener::domain::deletion_worker::{DeletionPool, DeletionQueue, PoolSettings};
use url_shortener::domain::repositories::UrlRepository;
use url_shortener::infrastructure::persistence::MemoryUrlRepository;
use url_shortener::routes;
use url_shortener::state::AppState;
use url_shortener::utils::identity::IdentitySigner;
use url_shortener::utils::key_generator::KeyGenerator;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://localhost:8080";

/// Server over a memory backend with a running deletion pool.
pub struct TestApp {
    pub server: TestServer,
    pub pool: DeletionPool,
    pub repository: Arc<MemoryUrlRepository>,
}

pub fn create_test_state(
    repository: Arc<dyn UrlRepository>,
    deletions: Option<DeletionQueue>,
) -> AppState {
    let mut service = UrlService::new(
        repository,
        KeyGenerator::default(),
        BASE_URL,
        Duration::from_secs(5),
    );

    if let Some(queue) = deletions {
        service = service.with_deletion_queue(queue);
    }

    AppState::new(Arc::new(service), IdentitySigner::new(SIGNING_SECRET).unwrap())
}

/// Must be called inside a Tokio runtime.
pub fn spawn_app() -> TestApp {
    let repository = Arc::new(MemoryUrlRepository::new());

    let mut pool = DeletionPool::new(repository.clone(), PoolSettings::new(2, 2));
    let queue = pool.start().unwrap();

    let state = create_test_state(repository.clone(), Some(queue));
    let server = TestServer::new(routes::router(state)).unwrap();

    TestApp {
        server,
        pool,
        repository,
    }
}

/// `Cookie` header value carrying a signed identity for `user_id`.
pub fn identity_cookie(user_id: &str) -> HeaderValue {
    let value = IdentitySigner::new(SIGNING_SECRET)
        .unwrap()
        .sign(user_id);
    HeaderValue::from_str(&format!("user_data={value}")).unwrap()
}

/// Extracts the short key from a short URL.
pub fn key_of(short_url: &str) -> &str {
    short_url.rsplit('/').next().unwrap()
}
