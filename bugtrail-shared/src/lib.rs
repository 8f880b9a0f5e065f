//! # BugTrail Shared Library
//!
//! This crate contains the types and business logic shared by the BugTrail
//! API server: database models, authentication primitives, authorization
//! predicates, and the outbound email boundary.
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations
//! - `auth`: Passwords, session tokens, OTP codes, request identity,
//!   authorization predicates
//! - `db`: Connection pool and migrations
//! - `email`: Outbound email transport (OTP delivery)

pub mod auth;
pub mod db;
pub mod email;
pub mod models;

/// Current version of the BugTrail shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
