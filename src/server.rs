//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, the deletion pool lifecycle, and the Axum
//! server with graceful shutdown.

use crate::application::services::UrlService;
use crate::config::Config;
use crate::domain::deletion_worker::DeletionPool;
use crate::infrastructure::persistence;
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::identity::IdentitySigner;
use crate::utils::key_generator::KeyGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage backend (PostgreSQL with migrations, file, or memory)
/// - Deletion worker pool
/// - Axum HTTP server
///
/// On Ctrl-C or SIGTERM the server stops accepting connections, finishes
/// in-flight requests, and then drains every queued deletion.
///
/// # Errors
///
/// Returns an error if:
/// - Storage cannot be opened
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let signer = IdentitySigner::new(&config.cookie_signing_secret)
        .context("Invalid COOKIE_SIGNING_SECRET")?;
    let repository = persistence::connect(&config).await?;

    let mut pool = DeletionPool::new(repository.clone(), config.pool_settings());
    let deletions = pool.start().context("Failed to start deletion pool")?;

    let url_service = UrlService::new(
        repository,
        KeyGenerator::new(config.key_strategy),
        config.base_url.clone(),
        config.storage_timeout(),
    )
    .with_deletion_queue(deletions);

    let state = AppState::new(Arc::new(url_service), signer);

    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_address))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let served = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Drain even if the server failed, so accepted deletions are not lost.
    tracing::info!("Server stopped, draining deletion queue");
    let report = pool.stop().await?;
    tracing::info!(
        "Drained {} deletion requests in {} batches",
        report.total_items(),
        report.total_batches()
    );

    served?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
