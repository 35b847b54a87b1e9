//! # Standup Shared Library
//!
//! This crate contains the data model, persistence, and authentication
//! primitives used by the Standup API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries (users, profiles, notes)
//! - `auth`: Password hashing, session tokens, and session extraction
//! - `db`: Connection pool and migrations
//! - `summaries`: Period windows and note aggregation

pub mod auth;
pub mod db;
pub mod models;
pub mod summaries;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
