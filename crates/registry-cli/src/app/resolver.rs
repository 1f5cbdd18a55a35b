//! Path resolution for config and registry files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, RegistryConfig};
use crate::errors::CliError;

/// Resolve the config file path, checking REGISTRY_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("REGISTRY_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the registry database path from CLI args or config.
pub fn resolve_registry_path(
    cli: &Cli,
    config: Option<&RegistryConfig>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.db.as_deref() {
        return Ok(PathBuf::from(path));
    }

    match config {
        Some(config) => Ok(PathBuf::from(&config.registry.path)),
        None => {
            let config_path = resolve_config_path()?;
            Err(CliError::not_found(
                missing_config_message(&config_path),
                "Hint: Pass --db or set REGISTRY_PATH to use a database directly.",
            )
            .into())
        }
    }
}

/// Error message when the registry database is missing.
pub fn missing_registry_message(path: &Path) -> String {
    format!(
        "No registry found at {}\n\nRun:\n  registry init\n\nOr specify a database path:\n  REGISTRY_PATH=/path/to/registry.db registry init",
        path.display()
    )
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "No registry config found at {}\n\nRun:\n  registry init",
        config_path.display()
    )
}

/// Exit with error code for not found errors.
///
/// This function prints the error and exits immediately.
/// Use `CliError::not_found` if you need to return an error instead.
pub fn exit_not_found_with_hint(message: &str, hint: &str) -> ! {
    CliError::not_found(message, hint).exit()
}
