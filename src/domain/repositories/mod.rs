//! Repository trait definitions for the domain layer.
//!
//! The storage layer is expressed as a single capability trait,
//! [`UrlRepository`], implemented by three interchangeable backends in
//! `crate::infrastructure::persistence`.
//!
//! # Testing
//!
//! Mock implementations are auto-generated via `mockall` for unit tests.
//! See integration tests in `tests/repository_*.rs` for backend behaviour.

pub mod storage_error;
pub mod url_repository;

pub use storage_error::StorageError;
pub use url_repository::UrlRepository;

#[cfg(test)]
pub use url_repository::MockUrlRepository;
