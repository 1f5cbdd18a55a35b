use crate::app::AppContext;
use crate::cli::ExportArgs;
use crate::helpers::{criteria_from_args, parse_export_format, ExportFormat};
use crate::output::entries_json;

pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    let format = parse_export_format(&args.format)?;
    let criteria = criteria_from_args(&args.filter)?;

    let service = ctx.open_service()?;
    let entries = service.export_filtered(&criteria)?;
    let values = entries_json(&entries, args.resolved)?;

    match format {
        ExportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        ExportFormat::Jsonl => {
            for value in values {
                println!("{}", serde_json::to_string(&value)?);
            }
        }
    }
    Ok(())
}
