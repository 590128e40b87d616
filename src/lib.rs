//! # URL Shortener
//!
//! A URL shortening service with pluggable storage and batched asynchronous
//! deletion, built with Axum.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Records, the storage contract, the deletion pool
//! - **Application Layer** ([`application`]) - Key generation and storage orchestration
//! - **Infrastructure Layer** ([`infrastructure`]) - Memory, file and PostgreSQL backends
//! - **API Layer** ([`api`]) - REST handlers, DTOs and middleware
//!
//! ## Storage
//!
//! One backend is active per process, chosen by [`config::Config::storage_backend`]:
//! PostgreSQL if a database is configured, else an append-only JSON lines file
//! if `FILE_STORAGE_PATH` is set, else memory.
//!
//! ## Quick Start
//!
//! ```bash
//! export COOKIE_SIGNING_SECRET="change-me"
//! export FILE_STORAGE_PATH="/var/lib/shortener/urls.json"
//!
//! cargo run -- -a 0.0.0.0:8080 -b https://sho.rt
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{SaveOutcome, UrlService};
    pub use crate::domain::deletion_worker::{DeletionPool, DeletionQueue, PoolSettings};
    pub use crate::domain::entities::{DeleteRequest, NewUrl, OwnedUrl};
    pub use crate::domain::repositories::{StorageError, UrlRepository};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
