//! Domain layer: records, the storage contract and background deletion.
//!
//! - [`entities`] - URL records and deletion requests
//! - [`repositories`] - The [`repositories::UrlRepository`] contract and its errors
//! - [`deletion_worker`] - Batched asynchronous soft-deletion
//!
//! Nothing here depends on HTTP or on a concrete storage backend.

pub mod deletion_worker;
pub mod entities;
pub mod repositories;
