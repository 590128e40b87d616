//! Application layer services.
//!
//! Services sit between the HTTP handlers and the storage contract: they
//! generate keys, apply storage deadlines, and recover conflict and deletion
//! signals into service-level outcomes.
//!
//! - [`services::url_service::UrlService`] - Shortening, resolution, listing and deletion scheduling

pub mod services;
