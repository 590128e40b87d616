//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{DeleteRequest, NewUrl, OwnedUrl};
use crate::domain::repositories::{StorageError, UrlRepository};
use crate::utils::db_error::map_insert_error;

const INSERT_URL: &str =
    "INSERT INTO urls (short_url, original_url, user_id) VALUES ($1, $2, $3)";

/// PostgreSQL repository backed by the `urls` table.
///
/// Relies on the database for isolation instead of an application lock.
/// Multi-row operations run inside a transaction that rolls back when the
/// future is dropped before commit.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

/// Active and deleted row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCounts {
    pub active: i64,
    pub deleted: i64,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Counts active and soft-deleted rows.
    pub async fn record_counts(&self) -> Result<RecordCounts, StorageError> {
        let (active, deleted): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT is_deleted),
                COUNT(*) FILTER (WHERE is_deleted)
            FROM urls
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(RecordCounts { active, deleted })
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn save(&self, new_url: NewUrl) -> Result<(), StorageError> {
        sqlx::query(INSERT_URL)
            .bind(&new_url.short_key)
            .bind(&new_url.original_url)
            .bind(&new_url.owner_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| map_insert_error(e, &new_url.short_key, &new_url.original_url))?;

        Ok(())
    }

    async fn save_batch(&self, batch: Vec<NewUrl>) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        for new_url in &batch {
            sqlx::query(INSERT_URL)
                .bind(&new_url.short_key)
                .bind(&new_url.original_url)
                .bind(&new_url.owner_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_insert_error(e, &new_url.short_key, &new_url.original_url))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, short_key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String, bool)> =
            sqlx::query_as("SELECT original_url, is_deleted FROM urls WHERE short_url = $1")
                .bind(short_key)
                .fetch_optional(self.pool.as_ref())
                .await?;

        match row {
            Some((_, true)) => Err(StorageError::Deleted),
            Some((original_url, false)) => Ok(Some(original_url)),
            None => Ok(None),
        }
    }

    async fn exists(&self, short_key: &str) -> Result<bool, StorageError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM urls WHERE short_url = $1)")
                .bind(short_key)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<String, StorageError> {
        let short_key: Option<String> = sqlx::query_scalar(
            "SELECT short_url FROM urls WHERE original_url = $1 AND NOT is_deleted",
        )
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        short_key.ok_or(StorageError::NotFound)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnedUrl>, StorageError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT short_url, original_url
            FROM urls
            WHERE user_id = $1 AND NOT is_deleted
            ORDER BY created_at, short_url
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(short_key, original_url)| OwnedUrl {
                short_key,
                original_url,
            })
            .collect())
    }

    async fn delete_batch(&self, requests: &[DeleteRequest]) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for request in requests {
            let result = sqlx::query(
                r#"
                UPDATE urls SET is_deleted = TRUE
                WHERE short_url = $1 AND user_id = $2 AND NOT is_deleted
                "#,
            )
            .bind(&request.short_key)
            .bind(&request.owner_id)
            .execute(&mut *tx)
            .await?;

            deleted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
