//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, registry database, entry).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Integrity check failed or stored counters are unusable.
    pub const INTEGRITY_FAILED: i32 = 6;

    /// Operation refused because the entry is not the tail.
    pub const CONFLICT: i32 = 7;
}
