//! kh-core: shared types, IDs, errors, configuration and account rules.
//!
//! This crate is the foundational dependency for all other kh-* crates,
//! providing type-safe identifiers, a unified error type, application
//! configuration, and the constants that describe a user account.

pub mod account;
pub mod config;
pub mod error;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
