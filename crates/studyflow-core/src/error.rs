//! Core error types for studyflow-core.
//!
//! This module defines the error hierarchy used across the library, built
//! on thiserror. Validation errors are raised before any I/O; everything
//! else aborts the enclosing transaction.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Plan generation errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A uniqueness constraint rejected an insert. The generation gate
    /// recovers from this by re-reading the winning row.
    #[error("Unique constraint conflict")]
    Conflict,

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors, surfaced to the caller before any transaction opens.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Malformed calendar date input
    #[error("Invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Missing required identifier (tenant/user)
    #[error("Missing required identifier: {0}")]
    MissingIdentifier(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised inside the generation pipeline. All of them roll back the
/// enclosing transaction, leaving no partial plan behind.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Reading the backlog pools failed
    #[error("Backlog query failed: {0}")]
    BacklogQueryFailed(#[source] DatabaseError),

    /// Any other failure during allocation or persistence
    #[error("Plan generation aborted: {0}")]
    Aborted(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => match err.code {
                rusqlite::ErrorCode::DatabaseLocked => DatabaseError::Locked,
                rusqlite::ErrorCode::ConstraintViolation => DatabaseError::Conflict,
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
