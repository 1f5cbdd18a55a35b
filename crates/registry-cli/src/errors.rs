//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use registry_core::RegistryError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, registry database, entry)
    NotFound { message: String, hint: String },

    /// Invalid user input or rejected field values
    InvalidInput {
        message: String,
        hint: Option<String>,
    },

    /// Refused because the entry is not the tail
    Conflict { message: String, hint: String },

    /// Integrity check failed or stored counters are unusable
    IntegrityFailed { message: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } | CliError::Conflict { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::InvalidInput { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::IntegrityFailed { message } => write!(
                f,
                "{}\nHint: Restore from a backup or export data before retrying.",
                message
            ),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an InvalidInput error with message and hint.
    pub fn invalid_input_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn conflict(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::Conflict {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn integrity_failed(message: impl Into<String>) -> Self {
        CliError::IntegrityFailed {
            message: message.into(),
        }
    }

    /// Map a core error to its CLI counterpart. Storage and other failures
    /// keep the generic exit code and return `None`.
    pub fn from_registry(err: &RegistryError) -> Option<Self> {
        match err {
            RegistryError::NotFound(msg) => Some(Self::not_found(
                format!("{} not found", msg),
                "Hint: Run `registry list` to find entry IDs.",
            )),
            RegistryError::Conflict(msg) => Some(Self::conflict(
                format!("Refused: {}", msg),
                "Hint: Only the most recent entry can be deleted.",
            )),
            RegistryError::Validation(msg) | RegistryError::InvalidInput(msg) => {
                Some(Self::invalid_input(msg.clone()))
            }
            RegistryError::DataIntegrity(msg) => Some(Self::integrity_failed(msg.clone())),
            RegistryError::Storage(_) => None,
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput { .. } => exit_codes::INVALID_INPUT,
            CliError::Conflict { .. } => exit_codes::CONFLICT,
            CliError::IntegrityFailed { .. } => exit_codes::INTEGRITY_FAILED,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    #[test]
    fn test_registry_errors_map_to_exit_codes() {
        let cases = [
            (RegistryError::NotFound("Entry x".into()), exit_codes::NOT_FOUND),
            (RegistryError::Conflict("not the tail".into()), exit_codes::CONFLICT),
            (RegistryError::Validation("bad".into()), exit_codes::INVALID_INPUT),
            (RegistryError::InvalidInput("bad".into()), exit_codes::INVALID_INPUT),
            (
                RegistryError::DataIntegrity("tail".into()),
                exit_codes::INTEGRITY_FAILED,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(
                CliError::from_registry(&err).map(|e| e.exit_code()),
                Some(code)
            );
        }
        assert!(CliError::from_registry(&RegistryError::Storage("busy".into())).is_none());
    }

    #[test]
    fn test_display_includes_hint() {
        let err = CliError::not_found("Entry not found", "Hint: Run `registry list`.");
        assert_eq!(err.to_string(), "Entry not found\nHint: Run `registry list`.");
    }
}
