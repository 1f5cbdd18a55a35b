use std::path::Path;

use registry_core::StorageEngine;

use crate::app::AppContext;
use crate::cli::BackupArgs;

pub fn handle_backup(ctx: &AppContext, args: &BackupArgs) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let destination = Path::new(&args.destination);
    service.storage().backup_to(destination).map_err(|e| {
        anyhow::anyhow!("Failed to back up registry to {}: {}", destination.display(), e)
    })?;

    if !ctx.quiet() {
        println!("Backed up registry to {}", args.destination);
    }
    Ok(())
}
