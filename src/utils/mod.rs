//! Utility functions shared across layers.
//!
//! - [`key_generator`] - Short key generation strategies
//! - [`identity`] - Signed owner identity cookie values
//! - [`db_error`] - PostgreSQL constraint violation mapping

pub mod db_error;
pub mod identity;
pub mod key_generator;
