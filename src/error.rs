//! Application error type and its HTTP rendering.
//!
//! Every handler returns [`AppError`], rendered as
//!
//! ```json
//! { "error": { "code": "not_found", "message": "...", "details": {} } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::repositories::StorageError;
use crate::utils::key_generator::KeyGenerationError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The resource existed but has been soft-deleted.
    #[error("{message}")]
    Gone { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Storage did not answer in time.
    #[error("{message}")]
    Unavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Gone { .. } => StatusCode::GONE,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_info(self) -> ErrorInfo {
        let (code, message, details) = match self {
            Self::Validation { message, details } => ("validation_error", message, details),
            Self::NotFound { message, details } => ("not_found", message, details),
            Self::Gone { message, details } => ("gone", message, details),
            Self::Conflict { message, details } => ("conflict", message, details),
            Self::Unavailable { message, details } => ("unavailable", message, details),
            Self::Internal { message, details } => ("internal_error", message, details),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::not_found("Short URL not found", json!({})),
            StorageError::Deleted => AppError::gone("Short URL has been deleted", json!({})),
            StorageError::AlreadyExists {
                original_url,
                existing_key,
            } => AppError::conflict(
                "URL has already been shortened",
                json!({ "original_url": original_url, "short_key": existing_key }),
            ),
            StorageError::DuplicateKey(key) => {
                tracing::error!("Short key {} collided with a stored record", key);
                AppError::internal("Failed to store the short URL", json!({}))
            }
            StorageError::Canceled => {
                AppError::unavailable("Storage did not respond in time", json!({}))
            }
            StorageError::Unsupported(operation) => {
                tracing::error!("Storage backend does not support {}", operation);
                AppError::internal(
                    "Operation not supported by storage backend",
                    json!({ "operation": operation }),
                )
            }
            failure => {
                tracing::error!("Storage failure: {}", failure);
                AppError::internal("Storage error", json!({}))
            }
        }
    }
}

impl From<KeyGenerationError> for AppError {
    fn from(e: KeyGenerationError) -> Self {
        match e {
            KeyGenerationError::Exhausted(attempts) => {
                tracing::error!("Key generation exhausted after {} attempts", attempts);
                AppError::internal(
                    "Failed to generate a unique short key",
                    json!({ "attempts": attempts }),
                )
            }
            KeyGenerationError::Storage(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Invalid request", json!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_status_mapping() {
        let cases = [
            (StorageError::NotFound, StatusCode::NOT_FOUND),
            (StorageError::Deleted, StatusCode::GONE),
            (
                StorageError::already_exists("https://a.example", Some("k1".into())),
                StatusCode::CONFLICT,
            ),
            (
                StorageError::DuplicateKey("k1".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (StorageError::Canceled, StatusCode::SERVICE_UNAVAILABLE),
            (
                StorageError::Unsupported("find_by_original_url"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StorageError::Io(std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (storage, status) in cases {
            assert_eq!(AppError::from(storage).status(), status);
        }
    }

    #[test]
    fn test_backend_failure_details_are_not_leaked() {
        let err = AppError::from(StorageError::Corrupted {
            line: 7,
            reason: "expected value".to_string(),
        });

        let info = err.to_error_info();
        assert_eq!(info.code, "internal_error");
        assert_eq!(info.details, json!({}));
    }

    #[test]
    fn test_key_generation_storage_error_keeps_mapping() {
        let err = AppError::from(KeyGenerationError::Storage(StorageError::Canceled));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
