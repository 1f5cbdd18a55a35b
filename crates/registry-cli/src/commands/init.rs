use std::path::PathBuf;

use registry_core::calendar::DEFAULT_TIMEZONE;
use registry_core::pagination::DEFAULT_PAGE_SIZE;
use registry_core::storage::{SqliteStorage, StorageEngine};
use registry_core::BusinessCalendar;

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_registry_path, write_config, RegistryConfig};
use crate::errors::CliError;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let target = match args.path.as_deref().or(ctx.cli().db.as_deref()) {
        Some(path) => PathBuf::from(path),
        None => default_registry_path()?,
    };
    if target.exists() {
        return Err(CliError::invalid_input_with_hint(
            format!("A registry already exists at {}", target.display()),
            "Hint: Choose another path or remove the existing file.",
        )
        .into());
    }

    let timezone = ctx.cli().timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
    let calendar = BusinessCalendar::from_name(timezone)
        .map_err(|e| CliError::invalid_input(e.to_string()))?;
    let page_size = args
        .page_size
        .map(|size| size as usize)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let ledger_id = SqliteStorage::create(&target)?;

    let config_path = resolve_config_path()?;
    let config = RegistryConfig::new(
        target.clone(),
        calendar.timezone().name().to_string(),
        page_size,
    );
    write_config(&config_path, &config)?;
    tracing::debug!(ledger = %ledger_id, config = %config_path.display(), "wrote config");

    if !ctx.quiet() {
        println!("Initialized registry at {}", target.display());
        println!("Config written to {}", config_path.display());
        println!("Timezone: {}", calendar.timezone().name());
    }
    Ok(())
}
