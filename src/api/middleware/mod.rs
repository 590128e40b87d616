//! HTTP middleware for request processing.
//!
//! Provides owner identity resolution and request tracing.

pub mod identity;
pub mod tracing;
