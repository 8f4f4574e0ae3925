//! Database query modules.

pub mod auth;
pub mod users;
