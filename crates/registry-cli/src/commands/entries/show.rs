use registry_core::RegistryError;

use crate::app::{exit_not_found_with_hint, AppContext};
use crate::cli::ShowArgs;
use crate::helpers::parse_entry_id;
use crate::output::{entry_json, print_entry};

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let id = parse_entry_id(&args.id)?;
    let service = ctx.open_service()?;

    let entry = match service.get(&id) {
        Ok(entry) => entry,
        Err(RegistryError::NotFound(_)) => exit_not_found_with_hint(
            "Entry not found",
            "Hint: Run `registry list` to find entry IDs.",
        ),
        Err(err) => return Err(err.into()),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry_json(&entry, true)?)?);
    } else {
        print_entry(&entry, service.calendar(), ctx.quiet());
    }
    Ok(())
}
