use registry_core::RegistryError;

use crate::app::AppContext;
use crate::cli::DeleteArgs;
use crate::errors::CliError;
use crate::helpers::parse_entry_id;
use crate::output::print_totals;

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let id = parse_entry_id(&args.id)?;
    let mut service = ctx.open_service()?;

    let totals = match service.delete(&id) {
        Ok(totals) => totals,
        Err(RegistryError::Conflict(_)) => {
            return Err(CliError::conflict(
                format!("Entry {} is not the most recent entry", id),
                "Hint: Only the entry marked in the TAIL column of `registry list` can be deleted.",
            )
            .into())
        }
        Err(err) => return Err(err.into()),
    };

    if !ctx.quiet() {
        println!("Deleted entry {}", id);
        print_totals(&totals);
    }
    Ok(())
}
