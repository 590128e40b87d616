//! URL record entity representing a short key to original URL mapping.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored record.
///
/// The transition is one-way: `Active` → `Deleted`. A deleted record keeps its
/// short key reserved, so the key is never handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    #[default]
    Active,
    Deleted,
}

impl RecordState {
    /// Builds the state from a persisted `is_deleted` flag.
    pub fn from_flag(is_deleted: bool) -> Self {
        if is_deleted { Self::Deleted } else { Self::Active }
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// A stored short link.
///
/// `owner_id` is the opaque identity of the creating user; an empty string
/// stands for the anonymous owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub short_key: String,
    pub original_url: String,
    pub owner_id: String,
    pub state: RecordState,
}

impl UrlRecord {
    /// Creates an active record.
    pub fn new(short_key: String, original_url: String, owner_id: String) -> Self {
        Self {
            short_key,
            original_url,
            owner_id,
            state: RecordState::Active,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.state.is_deleted()
    }

    /// Marks the record as deleted.
    ///
    /// Returns `true` if the record was active before the call.
    pub fn mark_deleted(&mut self) -> bool {
        let was_active = !self.state.is_deleted();
        self.state = RecordState::Deleted;
        was_active
    }
}

/// Input data for storing a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub short_key: String,
    pub original_url: String,
    pub owner_id: String,
}

impl NewUrl {
    pub fn new(
        short_key: impl Into<String>,
        original_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            short_key: short_key.into(),
            original_url: original_url.into(),
            owner_id: owner_id.into(),
        }
    }
}

impl From<NewUrl> for UrlRecord {
    fn from(new_url: NewUrl) -> Self {
        UrlRecord::new(new_url.short_key, new_url.original_url, new_url.owner_id)
    }
}

/// One entry of an owner's URL listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUrl {
    pub short_key: String,
    pub original_url: String,
}

/// A request to soft-delete one short key on behalf of its owner.
///
/// The storage layer applies it only when `owner_id` matches the record's
/// owner; mismatches are skipped silently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteRequest {
    pub owner_id: String,
    pub short_key: String,
}

impl DeleteRequest {
    pub fn new(owner_id: impl Into<String>, short_key: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            short_key: short_key.into(),
        }
    }
}
