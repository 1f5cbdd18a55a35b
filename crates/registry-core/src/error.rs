//! Error types for Registry core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to exit codes and user-facing hints.

use thiserror::Error;

/// Result type alias for Registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Core error type for Registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Target entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation rejected because it would break ledger continuity
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored ledger state cannot be trusted for counter assignment
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        RegistryError::Storage(format!("SQLite error: {}", err))
    }
}
