//! # Template Share Shared Library
//!
//! This crate contains the data layer and business logic used by both the
//! Template Share API server and the maintenance worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, JWT tokens, request auth context
//! - `db`: Connection pool and migrations
//! - `variables`: `{{name}}` placeholder extraction and substitution
//! - `transfer`: Bulk export/import of every table
//! - `dashboard`: Read-only aggregation queries for the admin dashboard

pub mod auth;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod transfer;
pub mod variables;

/// Current version of the Template Share shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
