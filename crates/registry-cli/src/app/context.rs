//! Application context for the Registry CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use registry_core::storage::{SqliteStorage, StorageOptions};
use registry_core::{BusinessCalendar, RegistrationService};

use crate::cli::Cli;
use crate::config::{read_config, RegistryConfig};
use crate::errors::CliError;

use super::resolver::{missing_registry_message, resolve_config_path, resolve_registry_path};

/// Application context that bundles CLI args with the config file.
///
/// The config is optional: `--db` alone is enough to run every command.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<RegistryConfig>>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Get the CLI arguments.
    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Get the config file contents, loading them lazily if needed.
    pub fn config(&self) -> anyhow::Result<Option<&RegistryConfig>> {
        self.config
            .get_or_try_init(|| {
                let path = resolve_config_path()?;
                if path.exists() {
                    read_config(&path).map(Some)
                } else {
                    Ok(None)
                }
            })
            .map(Option::as_ref)
    }

    pub fn registry_path(&self) -> anyhow::Result<PathBuf> {
        resolve_registry_path(self.cli, self.config()?)
    }

    /// Business calendar from `--timezone`, then config, then the default.
    pub fn calendar(&self) -> anyhow::Result<BusinessCalendar> {
        let name = match (self.cli.timezone.as_deref(), self.config()?) {
            (Some(tz), _) => tz.to_string(),
            (None, Some(config)) => config.calendar.timezone.clone(),
            (None, None) => return Ok(BusinessCalendar::default()),
        };
        BusinessCalendar::from_name(&name).map_err(|e| CliError::invalid_input(e.to_string()).into())
    }

    pub fn page_size(&self) -> anyhow::Result<usize> {
        Ok(self
            .config()?
            .map(|config| config.listing.page_size)
            .unwrap_or(registry_core::pagination::DEFAULT_PAGE_SIZE))
    }

    pub fn storage_options(&self) -> anyhow::Result<StorageOptions> {
        Ok(self
            .config()?
            .map(|config| config.storage.options())
            .unwrap_or_default())
    }

    /// Open the registry and wrap it in the registration service.
    pub fn open_service(&self) -> anyhow::Result<RegistrationService<SqliteStorage>> {
        let path = self.registry_path()?;
        if !path.exists() {
            return Err(CliError::not_found(
                missing_registry_message(&path),
                "Hint: Check --db, REGISTRY_PATH or the [registry] path in the config.",
            )
            .into());
        }
        let storage = SqliteStorage::open_with_options(&path, &self.storage_options()?)?;
        Ok(RegistrationService::new(storage, self.calendar()?).with_page_size(self.page_size()?))
    }
}
