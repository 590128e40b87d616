//! Error taxonomy shared by every storage backend.

use std::io;

/// Errors reported by [`super::UrlRepository`] implementations.
///
/// `NotFound`, `AlreadyExists` and `Deleted` describe the state of the data and
/// are usually recovered by the service layer. `Io`, `Database`, `Corrupted`
/// and `Serialization` are backend failures and always propagate unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    /// The original URL is already stored under another active short key.
    ///
    /// In-process backends know the conflicting key and attach it; the
    /// relational backend only sees the constraint violation.
    #[error("original url {original_url} already exists")]
    AlreadyExists {
        original_url: String,
        existing_key: Option<String>,
    },

    /// The short key is already taken, by an active or a deleted record.
    #[error("short key {0} is already taken")]
    DuplicateKey(String),

    #[error("record has been deleted")]
    Deleted,

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("storage operation canceled")]
    Canceled,

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupted storage file at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn already_exists(original_url: impl Into<String>, existing_key: Option<String>) -> Self {
        Self::AlreadyExists {
            original_url: original_url.into(),
            existing_key,
        }
    }

    /// Returns true for I/O, database and data-format failures.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Database(_) | Self::Corrupted { .. } | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failure_classification() {
        assert!(StorageError::Io(io::Error::other("disk full")).is_backend_failure());
        assert!(
            StorageError::Corrupted {
                line: 3,
                reason: "eof".to_string()
            }
            .is_backend_failure()
        );

        assert!(!StorageError::NotFound.is_backend_failure());
        assert!(!StorageError::Deleted.is_backend_failure());
        assert!(!StorageError::Canceled.is_backend_failure());
        assert!(!StorageError::already_exists("https://a.b", None).is_backend_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = StorageError::already_exists("https://example.com", Some("K1".to_string()));
        assert_eq!(
            err.to_string(),
            "original url https://example.com already exists"
        );

        let err = StorageError::Unsupported("find_by_original_url");
        assert!(err.to_string().contains("find_by_original_url"));
    }
}
