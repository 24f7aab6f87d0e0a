//! Error types for Petfolio infrastructure

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Unique constraint violation
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// User not found
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Role not found
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// Pet not found
    #[error("pet not found: {0}")]
    PetNotFound(i64),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
