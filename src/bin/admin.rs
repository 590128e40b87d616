//! CLI administration tool for url-shortener.
//!
//! Inspects storage without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Replay a storage file and report what it holds
//! cargo run --bin url-admin -- file verify /var/lib/shortener/urls.json
//!
//! # Check the database connection and count records
//! cargo run --bin url-admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string, required by `db` commands

use url_shortener::infrastructure::persistence::{FileUrlRepository, PgUrlRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for inspecting url-shortener storage.
#[derive(Parser)]
#[command(name = "url-admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append-only storage file operations
    File {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum FileAction {
    /// Replay a storage file and report record counts
    Verify {
        /// Path of the storage file
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection and count records
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::File { action } => handle_file_action(action).await?,
        Commands::Db { action } => handle_db_action(action).await?,
    }

    Ok(())
}

/// Handles storage file commands.
async fn handle_file_action(action: FileAction) -> Result<()> {
    match action {
        FileAction::Verify { path } => {
            println!(
                "{} {}",
                "🔍 Replaying".bright_blue(),
                path.display().to_string().bright_white()
            );

            if !path.exists() {
                anyhow::bail!("{} does not exist", path.display());
            }

            let repository = FileUrlRepository::open(&path)
                .with_context(|| format!("{} failed verification", path.display()))?;
            let stats = repository.stats().await;

            println!("{}", "✅ Storage file is consistent".green().bold());
            println!();
            println!(
                "  Records: {}",
                stats.records.to_string().bright_green().bold()
            );
            println!(
                "  Deleted: {}",
                stats.deleted.to_string().bright_yellow().bold()
            );
            println!(
                "  Owners:  {}",
                stats.owners.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction) -> Result<()> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = PgPool::connect(&database_url)
                .await
                .context("Failed to connect to database")?;

            let repository = PgUrlRepository::new(Arc::new(pool));
            let counts = repository
                .record_counts()
                .await
                .context("Failed to count records, are migrations applied?")?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!();
            println!(
                "  Active URLs:  {}",
                counts.active.to_string().bright_green().bold()
            );
            println!(
                "  Deleted URLs: {}",
                counts.deleted.to_string().bright_yellow().bold()
            );
            println!();
        }
    }

    Ok(())
}
