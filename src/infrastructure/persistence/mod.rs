//! Storage backend implementations.
//!
//! Three interchangeable implementations of
//! [`crate::domain::repositories::UrlRepository`]:
//!
//! - [`MemoryUrlRepository`] - volatile map guarded by one lock
//! - [`FileUrlRepository`] - append-only JSON lines file replayed on startup
//! - [`PgUrlRepository`] - PostgreSQL `urls` table
//!
//! The backend is selected once at startup by [`connect`].

pub mod file_url_repository;
pub mod memory_url_repository;
pub mod pg_url_repository;
mod url_index;

pub use file_url_repository::{FileStats, FileUrlRepository};
pub use memory_url_repository::MemoryUrlRepository;
pub use pg_url_repository::{PgUrlRepository, RecordCounts};

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::config::{Config, StorageBackend};
use crate::domain::repositories::UrlRepository;

/// Number of connection attempts before PostgreSQL startup gives up.
const CONNECT_ATTEMPTS: usize = 5;

/// Builds the storage backend selected by the configuration.
///
/// For PostgreSQL this connects with retry and applies pending migrations
/// before the repository is handed out.
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, or the
/// storage file cannot be opened or replayed.
pub async fn connect(config: &Config) -> Result<Arc<dyn UrlRepository>> {
    match config.storage_backend() {
        StorageBackend::Postgres(database_url) => {
            let pool = connect_pool(config, database_url).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to apply migrations")?;

            Ok(Arc::new(PgUrlRepository::new(Arc::new(pool))))
        }
        StorageBackend::File(path) => {
            let repository = FileUrlRepository::open(path)
                .with_context(|| format!("Failed to open storage file {}", path.display()))?;
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryUrlRepository::new())),
    }
}

/// Opens a PostgreSQL pool using the configured pool settings.
pub async fn connect_pool(config: &Config, database_url: &str) -> Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime));

    let strategy = ExponentialBackoff::from_millis(100)
        .map(jitter)
        .take(CONNECT_ATTEMPTS - 1);

    Retry::spawn(strategy, || {
        let options = options.clone();
        async move {
            options.connect(database_url).await.inspect_err(|e| {
                tracing::warn!("Database connection attempt failed: {}", e);
            })
        }
    })
    .await
    .context("Failed to connect to database")
}
