//! Shared utilities, configuration, and error handling for Reelhouse
//!
//! This crate provides common functionality used across the Reelhouse backend:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Keyset cursor pagination
//! - Password hashing

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod pagination;

pub use crypto::{hash_password, verify_password};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{ValidatedJson, ValidatedQuery};
pub use pagination::{
    ColumnKind, Cursor, CursorPagination, KeysetQuery, OrderTerm, PaginationError, SortColumn,
    SortDirection,
};
