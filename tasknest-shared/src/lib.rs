//! # TaskNest Shared Library
//!
//! This crate contains the types and business logic shared by the TaskNest
//! API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models with ownership-scoped CRUD operations
//! - `auth`: Password hashing, JWT tokens, and the authorization gate
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskNest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
