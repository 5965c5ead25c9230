//! Shared database types for Reelhouse repositories

use crate::error::Error;
use thiserror::Error;

/// Repository-level failures, converted to API errors at the handler boundary
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The referenced entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `AlreadyExists`, keep everything else.
    pub fn from_unique_violation(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::AlreadyExists(what.to_string())
            }
            _ => RepositoryError::Connection(err),
        }
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Error::NotFound(err.to_string()),
            RepositoryError::AlreadyExists(_) => Error::Conflict(err.to_string()),
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Validation(msg),
        }
    }
}
