//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without storage logic.
//!
//! # Entity Types
//!
//! - [`UrlRecord`] - A stored short key to original URL mapping
//! - [`NewUrl`] - Input for creating a record
//! - [`OwnedUrl`] - One entry of a per-owner listing
//! - [`DeleteRequest`] - A soft-delete request scoped to an owner

pub mod url_record;

pub use url_record::{DeleteRequest, NewUrl, OwnedUrl, RecordState, UrlRecord};
