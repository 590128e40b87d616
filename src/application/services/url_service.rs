//! Short URL creation, resolution and listing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::domain::deletion_worker::DeletionQueue;
use crate::domain::entities::{NewUrl, OwnedUrl};
use crate::domain::repositories::{StorageError, UrlRepository};
use crate::error::AppError;
use crate::utils::key_generator::KeyGenerator;

/// Save attempts before a run of taken keys is reported as a failure.
const SAVE_ATTEMPTS: usize = 3;

/// Result of [`UrlService::save_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new record was stored under this key.
    Created(String),
    /// The URL was already shortened; this is the pre-existing key.
    Existing(String),
}

impl SaveOutcome {
    pub fn short_key(&self) -> &str {
        match self {
            Self::Created(key) | Self::Existing(key) => key,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing(_))
    }
}

/// One entry of a batch shortening request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Opaque caller token echoed back in the result.
    pub correlation_id: String,
    pub original_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_key: String,
}

/// Orchestrates key generation, storage and deletion scheduling.
///
/// Every storage call runs under the configured deadline; expiry surfaces as
/// [`StorageError::Canceled`] and maps to `503 Service Unavailable`.
pub struct UrlService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    keys: KeyGenerator,
    base_url: String,
    timeout: Duration,
    deletions: Option<DeletionQueue>,
}

impl<R: UrlRepository + ?Sized> UrlService<R> {
    pub fn new(
        repository: Arc<R>,
        keys: KeyGenerator,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            keys,
            base_url: base_url.into(),
            timeout,
            deletions: None,
        }
    }

    /// Routes [`Self::delete_urls`] to a running deletion pool.
    pub fn with_deletion_queue(mut self, queue: DeletionQueue) -> Self {
        self.deletions = Some(queue);
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    async fn within<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<StorageError>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .unwrap_or_else(|_| Err(StorageError::Canceled.into()))
    }

    /// Shortens `original_url` on behalf of `owner_id`.
    ///
    /// The URL is stored exactly as given. If an active record already holds
    /// it, that key is returned as [`SaveOutcome::Existing`] and nothing is
    /// written. A freshly drawn key that turns out to be taken is redrawn.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty URL,
    /// [`AppError::Unavailable`] when storage misses the deadline, and
    /// [`AppError::Internal`] for backend failures or when every drawn key
    /// was taken.
    pub async fn save_url(
        &self,
        original_url: &str,
        owner_id: &str,
    ) -> Result<SaveOutcome, AppError> {
        require_url(original_url)?;

        for attempt in 1..=SAVE_ATTEMPTS {
            let short_key = self.within(self.keys.generate(&*self.repository)).await?;
            let new_url = NewUrl::new(short_key.clone(), original_url, owner_id);

            match self.within(self.repository.save(new_url)).await {
                Ok(()) => {
                    tracing::debug!("Saved {} as {}", original_url, short_key);
                    return Ok(SaveOutcome::Created(short_key));
                }
                Err(StorageError::AlreadyExists {
                    existing_key: Some(existing),
                    ..
                }) => return Ok(SaveOutcome::Existing(existing)),
                Err(StorageError::AlreadyExists {
                    existing_key: None,
                    ..
                }) => match self
                    .within(self.repository.find_by_original_url(original_url))
                    .await
                {
                    Ok(existing) => return Ok(SaveOutcome::Existing(existing)),
                    // The holder was deleted after our insert was rejected.
                    Err(StorageError::NotFound) => {
                        tracing::debug!(
                            "Conflicting record for {} vanished, retrying",
                            original_url
                        );
                    }
                    Err(e) => return Err(e.into()),
                },
                Err(StorageError::DuplicateKey(key)) => {
                    tracing::warn!("Short key {} taken on attempt {}, redrawing", key, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(save_exhausted())
    }

    /// Resolves a short key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown key and [`AppError::Gone`]
    /// for a soft-deleted one.
    pub async fn get_url(&self, short_key: &str) -> Result<String, AppError> {
        match self.within(self.repository.get(short_key)).await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => Err(AppError::not_found(
                "Short URL not found",
                json!({ "short_key": short_key }),
            )),
            Err(StorageError::Deleted) => Err(AppError::gone(
                "Short URL has been deleted",
                json!({ "short_key": short_key }),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists the active URLs of `owner_id`; empty when there are none.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnedUrl>, AppError> {
        Ok(self.within(self.repository.list_by_owner(owner_id)).await?)
    }

    /// Shortens several URLs at once, preserving input order in the result.
    ///
    /// The batch is stored as a whole: if any URL is already shortened the
    /// call fails with [`AppError::Conflict`] and nothing is written. A key
    /// clash redraws every key of the batch.
    pub async fn save_batch(
        &self,
        items: Vec<BatchItem>,
        owner_id: &str,
    ) -> Result<Vec<BatchResult>, AppError> {
        for item in &items {
            require_url(&item.original_url)?;
        }

        for attempt in 1..=SAVE_ATTEMPTS {
            let keys = self
                .within(self.keys.generate_many(&*self.repository, items.len()))
                .await?;

            let batch = items
                .iter()
                .zip(&keys)
                .map(|(item, key)| {
                    NewUrl::new(key.clone(), item.original_url.as_str(), owner_id)
                })
                .collect();

            match self.within(self.repository.save_batch(batch)).await {
                Ok(()) => {
                    return Ok(items
                        .iter()
                        .zip(keys)
                        .map(|(item, short_key)| BatchResult {
                            correlation_id: item.correlation_id.clone(),
                            short_key,
                        })
                        .collect());
                }
                Err(StorageError::DuplicateKey(key)) => {
                    tracing::warn!("Batch key {} taken on attempt {}, redrawing", key, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(save_exhausted())
    }

    /// Schedules soft-deletion of `short_keys` owned by `owner_id`.
    ///
    /// Returns as soon as the keys are queued. Keys the owner does not hold
    /// are skipped later without notice.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] when no deletion pool is running.
    pub fn delete_urls(&self, owner_id: &str, short_keys: Vec<String>) -> Result<usize, AppError> {
        let queue = self.deletions.as_ref().ok_or_else(|| {
            AppError::unavailable("Deletion is not available", json!({}))
        })?;

        queue.submit_all(owner_id, short_keys).map_err(|e| {
            tracing::warn!("Rejected deletion request: {}", e);
            AppError::unavailable("Deletion queue is closed", json!({}))
        })
    }

    /// Checks that storage answers within the deadline.
    pub async fn ping(&self) -> Result<(), AppError> {
        Ok(self.within(self.repository.ping()).await?)
    }

    /// Builds the public short URL for a key.
    pub fn short_url(&self, short_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), short_key)
    }
}

fn require_url(original_url: &str) -> Result<(), AppError> {
    if original_url.is_empty() {
        return Err(AppError::bad_request(
            "URL must not be empty",
            json!({ "field": "url" }),
        ));
    }
    Ok(())
}

fn save_exhausted() -> AppError {
    tracing::error!("No free short key after {} save attempts", SAVE_ATTEMPTS);
    AppError::internal(
        "Failed to store the short URL",
        json!({ "attempts": SAVE_ATTEMPTS }),
    )
}
