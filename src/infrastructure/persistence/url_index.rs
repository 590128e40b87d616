//! In-process index shared by the memory and file backends.
//!
//! Holds every record ever stored plus two secondary indexes: active original
//! URLs and per-owner key lists. Callers serialize access with their own lock.

use std::collections::{HashMap, HashSet};

use crate::domain::entities::{DeleteRequest, NewUrl, OwnedUrl, UrlRecord};
use crate::domain::repositories::StorageError;

#[derive(Debug, Default)]
pub(crate) struct UrlIndex {
    records: HashMap<String, UrlRecord>,
    /// Original URL → short key, active records only.
    active_urls: HashMap<String, String>,
    /// Owner → short keys in insertion order.
    owners: HashMap<String, Vec<String>>,
}

impl UrlIndex {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.records.values().filter(|r| r.is_deleted()).count()
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Checks that `new_url` can be inserted without breaking uniqueness.
    pub fn check_insert(&self, new_url: &NewUrl) -> Result<(), StorageError> {
        if self.records.contains_key(&new_url.short_key) {
            return Err(StorageError::DuplicateKey(new_url.short_key.clone()));
        }

        if let Some(existing) = self.active_urls.get(&new_url.original_url) {
            return Err(StorageError::already_exists(
                new_url.original_url.clone(),
                Some(existing.clone()),
            ));
        }

        Ok(())
    }

    /// Checks a whole batch, including conflicts between its own entries.
    pub fn check_batch(&self, batch: &[NewUrl]) -> Result<(), StorageError> {
        let mut keys = HashSet::with_capacity(batch.len());
        let mut urls: HashMap<&str, &str> = HashMap::with_capacity(batch.len());

        for new_url in batch {
            self.check_insert(new_url)?;

            if !keys.insert(new_url.short_key.as_str()) {
                return Err(StorageError::DuplicateKey(new_url.short_key.clone()));
            }

            if let Some(first_key) = urls.insert(&new_url.original_url, &new_url.short_key) {
                return Err(StorageError::already_exists(
                    new_url.original_url.clone(),
                    Some(first_key.to_string()),
                ));
            }
        }

        Ok(())
    }

    /// Inserts a record. Uniqueness must have been checked beforehand.
    pub fn insert(&mut self, record: UrlRecord) {
        if !record.is_deleted() {
            self.active_urls
                .insert(record.original_url.clone(), record.short_key.clone());
        }

        self.owners
            .entry(record.owner_id.clone())
            .or_default()
            .push(record.short_key.clone());

        self.records.insert(record.short_key.clone(), record);
    }

    pub fn get(&self, short_key: &str) -> Result<Option<String>, StorageError> {
        match self.records.get(short_key) {
            Some(record) if record.is_deleted() => Err(StorageError::Deleted),
            Some(record) => Ok(Some(record.original_url.clone())),
            None => Ok(None),
        }
    }

    pub fn record(&self, short_key: &str) -> Option<&UrlRecord> {
        self.records.get(short_key)
    }

    pub fn contains(&self, short_key: &str) -> bool {
        self.records.contains_key(short_key)
    }

    pub fn find_by_original_url(&self, original_url: &str) -> Option<String> {
        self.active_urls.get(original_url).cloned()
    }

    pub fn list_by_owner(&self, owner_id: &str) -> Vec<OwnedUrl> {
        let Some(keys) = self.owners.get(owner_id) else {
            return Vec::new();
        };

        keys.iter()
            .filter_map(|key| self.records.get(key))
            .filter(|record| !record.is_deleted())
            .map(|record| OwnedUrl {
                short_key: record.short_key.clone(),
                original_url: record.original_url.clone(),
            })
            .collect()
    }

    /// Returns the records a delete batch would change, without changing them.
    ///
    /// Unknown keys, foreign owners and already deleted records are skipped.
    /// A key requested twice appears once.
    pub fn pending_deletes(&self, requests: &[DeleteRequest]) -> Vec<UrlRecord> {
        let mut seen = HashSet::new();

        requests
            .iter()
            .filter_map(|request| {
                let record = self.records.get(&request.short_key)?;
                let applies = record.owner_id == request.owner_id && !record.is_deleted();

                (applies && seen.insert(record.short_key.as_str())).then(|| record.clone())
            })
            .collect()
    }

    /// Marks a record deleted and frees its original URL.
    ///
    /// Returns true if the record changed state.
    pub fn mark_deleted(&mut self, short_key: &str) -> bool {
        let Some(record) = self.records.get_mut(short_key) else {
            return false;
        };

        if !record.mark_deleted() {
            return false;
        }

        if self
            .active_urls
            .get(&record.original_url)
            .is_some_and(|key| key == short_key)
        {
            self.active_urls.remove(&record.original_url);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(entries: &[(&str, &str, &str)]) -> UrlIndex {
        let mut index = UrlIndex::default();
        for (key, url, owner) in entries {
            index.insert(NewUrl::new(*key, *url, *owner).into());
        }
        index
    }

    #[test]
    fn test_check_insert_rejects_active_duplicate_url() {
        let index = index_with(&[("K1", "https://example.com/a", "u1")]);

        let err = index
            .check_insert(&NewUrl::new("K2", "https://example.com/a", "u2"))
            .unwrap_err();

        match err {
            StorageError::AlreadyExists { existing_key, .. } => {
                assert_eq!(existing_key.as_deref(), Some("K1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_insert_rejects_taken_key() {
        let index = index_with(&[("K1", "https://example.com/a", "u1")]);

        let err = index
            .check_insert(&NewUrl::new("K1", "https://example.com/b", "u1"))
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateKey(key) if key == "K1"));
    }

    #[test]
    fn test_check_batch_detects_internal_conflicts() {
        let index = UrlIndex::default();

        let same_url = vec![
            NewUrl::new("K1", "https://example.com/a", ""),
            NewUrl::new("K2", "https://example.com/a", ""),
        ];
        assert!(matches!(
            index.check_batch(&same_url),
            Err(StorageError::AlreadyExists { .. })
        ));

        let same_key = vec![
            NewUrl::new("K1", "https://example.com/a", ""),
            NewUrl::new("K1", "https://example.com/b", ""),
        ];
        assert!(matches!(
            index.check_batch(&same_key),
            Err(StorageError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_deleted_url_can_be_stored_again() {
        let mut index = index_with(&[("K1", "https://example.com/a", "u1")]);

        assert!(index.mark_deleted("K1"));
        assert!(matches!(index.get("K1"), Err(StorageError::Deleted)));
        assert!(index.find_by_original_url("https://example.com/a").is_none());

        // The key stays reserved while the URL is free again.
        assert!(index.contains("K1"));
        assert!(
            index
                .check_insert(&NewUrl::new("K2", "https://example.com/a", "u1"))
                .is_ok()
        );
    }

    #[test]
    fn test_pending_deletes_skips_foreign_and_repeated_keys() {
        let index = index_with(&[
            ("K1", "https://example.com/a", "u1"),
            ("K2", "https://example.com/b", "u2"),
        ]);

        let pending = index.pending_deletes(&[
            DeleteRequest::new("u1", "K1"),
            DeleteRequest::new("u1", "K1"),
            DeleteRequest::new("u1", "K2"),
            DeleteRequest::new("u1", "missing"),
        ]);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].short_key, "K1");
    }

    #[test]
    fn test_list_by_owner_keeps_insertion_order() {
        let mut index = index_with(&[
            ("K3", "https://example.com/c", "u1"),
            ("K1", "https://example.com/a", "u1"),
            ("K2", "https://example.com/b", "u2"),
        ]);

        let keys: Vec<_> = index
            .list_by_owner("u1")
            .into_iter()
            .map(|u| u.short_key)
            .collect();
        assert_eq!(keys, vec!["K3", "K1"]);

        index.mark_deleted("K3");
        assert_eq!(index.list_by_owner("u1").len(), 1);
        assert!(index.list_by_owner("nobody").is_empty());
    }
}
