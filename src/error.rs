//! Error types for the fncm library.
//!
//! This module provides custom error types using `thiserror`. The first four
//! variants are user-facing outcomes (bad input, duplicates, missing rows,
//! constraint violations); the rest wrap failures from the underlying crates.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur in the fncm application.
#[derive(Error, Debug)]
pub enum FncmError {
    /// A required field is empty, too long, or has forbidden characters
    #[error("Validation error: {0}")]
    Validation(String),

    /// A client, food item or profile with the same name already exists
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// The selected row or profile does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Foreign-key, uniqueness or check violation reported by SQLite
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience type alias for Result with `FncmError`
pub type Result<T> = std::result::Result<T, FncmError>;

impl FncmError {
    /// True for outcomes caused by user input rather than a store failure.
    ///
    /// These are reported to the user and logged as warnings.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Duplicate(_) | Self::NotFound(_) | Self::Constraint(_)
        )
    }
}

impl From<rusqlite::Error> for FncmError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                Self::Constraint(detail)
            }
            other => Self::Database(other),
        }
    }
}

impl From<config::ConfigError> for FncmError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
