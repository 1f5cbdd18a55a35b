//! Application-level utilities for the Registry CLI.
//!
//! This module provides:
//! - Path resolution for config and registry files
//! - The command context that lazily loads configuration

mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use resolver::{exit_not_found_with_hint, resolve_config_path};
