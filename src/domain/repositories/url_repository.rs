//! Repository trait for short link storage.

use crate::domain::entities::{DeleteRequest, NewUrl, OwnedUrl};
use crate::domain::repositories::StorageError;
use async_trait::async_trait;

/// Storage capability set shared by every backend.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - process-lifetime map
/// - [`crate::infrastructure::persistence::FileUrlRepository`] - append-only JSON lines file
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL
/// - Test mocks available with `cfg(test)`
///
/// The concrete backend is chosen once at startup, see
/// [`crate::infrastructure::persistence::connect`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Stores a single record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`] if an active record already
    /// holds the same original URL. Nothing is written in that case.
    async fn save(&self, new_url: NewUrl) -> Result<(), StorageError>;

    /// Stores several records.
    ///
    /// The relational backend commits all or nothing. The in-process backends
    /// validate the whole batch before applying it.
    async fn save_batch(&self, batch: Vec<NewUrl>) -> Result<(), StorageError>;

    /// Resolves a short key to its original URL.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` for an active record
    /// - `Ok(None)` if the key is unknown
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Deleted`] if the record was soft-deleted.
    async fn get(&self, short_key: &str) -> Result<Option<String>, StorageError>;

    /// Returns true if the key is taken, including by a deleted record.
    async fn exists(&self, short_key: &str) -> Result<bool, StorageError>;

    /// Finds the short key of the active record holding `original_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no active record matches, or
    /// [`StorageError::Unsupported`] for backends without this index.
    async fn find_by_original_url(&self, original_url: &str) -> Result<String, StorageError>;

    /// Lists the active records created by `owner_id`, in insertion order.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnedUrl>, StorageError>;

    /// Soft-deletes every record whose key and owner match a request.
    ///
    /// Requests naming another owner's key, an unknown key, or an already
    /// deleted record are skipped without error. Returns the number of records
    /// that changed state.
    async fn delete_batch(&self, requests: &[DeleteRequest]) -> Result<u64, StorageError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}
