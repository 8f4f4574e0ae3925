//! Route handlers for the HTTP API.

pub mod account;
pub mod auth;
pub mod docs;
pub mod health;
pub mod welcome;
