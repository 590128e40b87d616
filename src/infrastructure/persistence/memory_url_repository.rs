//! Volatile in-memory implementation of the URL repository.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::url_index::UrlIndex;
use crate::domain::entities::{DeleteRequest, NewUrl, OwnedUrl, UrlRecord};
use crate::domain::repositories::{StorageError, UrlRepository};

/// Process-lifetime repository without persistence.
///
/// All mutations go through a single write lock. Intended for development,
/// tests, and deployments that accept losing links on restart.
#[derive(Default)]
pub struct MemoryUrlRepository {
    index: RwLock<UrlIndex>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        debug!("Using in-memory storage");
        Self::default()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn save(&self, new_url: NewUrl) -> Result<(), StorageError> {
        let mut index = self.index.write().await;
        index.check_insert(&new_url)?;
        index.insert(new_url.into());
        Ok(())
    }

    async fn save_batch(&self, batch: Vec<NewUrl>) -> Result<(), StorageError> {
        let mut index = self.index.write().await;
        index.check_batch(&batch)?;

        for new_url in batch {
            index.insert(UrlRecord::from(new_url));
        }

        Ok(())
    }

    async fn get(&self, short_key: &str) -> Result<Option<String>, StorageError> {
        self.index.read().await.get(short_key)
    }

    async fn exists(&self, short_key: &str) -> Result<bool, StorageError> {
        Ok(self.index.read().await.contains(short_key))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<String, StorageError> {
        self.index
            .read()
            .await
            .find_by_original_url(original_url)
            .ok_or(StorageError::NotFound)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnedUrl>, StorageError> {
        Ok(self.index.read().await.list_by_owner(owner_id))
    }

    async fn delete_batch(&self, requests: &[DeleteRequest]) -> Result<u64, StorageError> {
        let mut index = self.index.write().await;

        let mut deleted = 0;
        for record in index.pending_deletes(requests) {
            if index.mark_deleted(&record.short_key) {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = MemoryUrlRepository::new();

        repo.save(NewUrl::new("K1", "https://example.com", "u1"))
            .await
            .unwrap();

        assert_eq!(
            repo.get("K1").await.unwrap().as_deref(),
            Some("https://example.com")
        );
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_duplicate_url_carries_existing_key() {
        let repo = MemoryUrlRepository::new();
        repo.save(NewUrl::new("K1", "https://example.com", "u1"))
            .await
            .unwrap();

        let err = repo
            .save(NewUrl::new("K2", "https://example.com", "u2"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::AlreadyExists { existing_key: Some(ref key), .. } if key == "K1"
        ));
        assert!(!repo.exists("K2").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_partial_state() {
        let repo = MemoryUrlRepository::new();
        repo.save(NewUrl::new("K1", "https://example.com/a", ""))
            .await
            .unwrap();

        let result = repo
            .save_batch(vec![
                NewUrl::new("K2", "https://example.com/b", ""),
                NewUrl::new("K3", "https://example.com/a", ""),
            ])
            .await;

        assert!(result.is_err());
        assert!(!repo.exists("K2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_batch_respects_owner() {
        let repo = MemoryUrlRepository::new();
        repo.save(NewUrl::new("K1", "https://example.com/a", "u1"))
            .await
            .unwrap();
        repo.save(NewUrl::new("K2", "https://example.com/b", "u2"))
            .await
            .unwrap();

        let deleted = repo
            .delete_batch(&[DeleteRequest::new("u1", "K1"), DeleteRequest::new("u1", "K2")])
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(matches!(repo.get("K1").await, Err(StorageError::Deleted)));
        assert!(repo.get("K2").await.unwrap().is_some());
    }
}
