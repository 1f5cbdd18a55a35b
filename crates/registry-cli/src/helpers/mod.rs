//! Input and parsing helper functions for the CLI.
//!
//! This module provides utilities for:
//! - Datetime, identifier, gender, and format parsing (`parsing`)
//! - Turning command arguments into core request types (`fields`)

mod fields;
mod parsing;

// Re-export public API
pub use fields::{criteria_from_args, details_from_args, patch_from_args};
pub use parsing::{
    parse_datetime, parse_entry_id, parse_export_format, parse_output_format, ExportFormat,
    OutputFormat,
};
