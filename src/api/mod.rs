//! HTTP API layer.
//!
//! Translates HTTP requests into [`crate::application::services::UrlService`]
//! calls and formats their outcomes.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Identity cookie and request tracing
//! - [`routes`] - `/api` route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
