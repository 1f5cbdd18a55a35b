use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::errors::CliError;
use crate::helpers::{criteria_from_args, parse_output_format, OutputFormat};
use crate::output::{page_json, print_entry_page};

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let criteria = criteria_from_args(&args.filter)?;
    let format = parse_output_format(args.format.as_deref())?;
    if args.json && format.is_some() {
        return Err(CliError::invalid_input("--format cannot be used with --json").into());
    }

    let service = ctx.open_service()?;
    let request = service.page_request(args.page, args.limit);
    let page = service.list_filtered(&criteria, request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page_json(&page)?)?);
    } else {
        print_entry_page(
            &page,
            service.calendar(),
            format.unwrap_or(OutputFormat::Table),
            ctx.quiet(),
        );
    }
    Ok(())
}
