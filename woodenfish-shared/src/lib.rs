//! # WoodenFish Shared Library
//!
//! Data layer and account utilities used by the WoodenFish API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: database models and their queries
//! - `auth`: password hashing and phone verification helpers

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the WoodenFish shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
