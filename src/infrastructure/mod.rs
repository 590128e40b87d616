//! Infrastructure layer.
//!
//! - [`persistence`] - Memory, file and PostgreSQL storage backends

pub mod persistence;
