use crate::app::AppContext;
use crate::cli::EditArgs;
use crate::helpers::{parse_entry_id, patch_from_args};
use crate::output::entry_json;

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let id = parse_entry_id(&args.id)?;
    let patch = patch_from_args(args)?;

    let mut service = ctx.open_service()?;
    let (entry, _totals) = service.update(&id, &patch)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry_json(&entry, false)?)?);
    } else if !ctx.quiet() {
        println!("Updated entry {}", entry.id);
    }
    Ok(())
}
