//! Translation of PostgreSQL constraint violations into storage errors.

use crate::domain::repositories::StorageError;

/// Partial unique index on `urls.original_url` for non-deleted rows.
pub const ORIGINAL_URL_INDEX: &str = "urls_original_url_key";

/// Primary key constraint on `urls.short_url`.
pub const SHORT_URL_PKEY: &str = "urls_pkey";

/// Returns true if `e` is a unique violation on the named constraint or index.
pub fn is_unique_violation_on(e: &sqlx::Error, constraint: &str) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    db_err.constraint() == Some(constraint)
}

/// Maps an insert failure to the storage taxonomy.
///
/// Violations of the original URL index become [`StorageError::AlreadyExists`]
/// without a key; the caller recovers it with a lookup. Primary key violations
/// become [`StorageError::DuplicateKey`]. Everything else stays a database error.
pub fn map_insert_error(e: sqlx::Error, short_key: &str, original_url: &str) -> StorageError {
    if is_unique_violation_on(&e, ORIGINAL_URL_INDEX) {
        return StorageError::already_exists(original_url, None);
    }

    if is_unique_violation_on(&e, SHORT_URL_PKEY) {
        return StorageError::DuplicateKey(short_key.to_string());
    }

    StorageError::Database(e)
}
