use registry_core::storage::NewEntry;

use crate::app::AppContext;
use crate::cli::AddArgs;
use crate::helpers::{details_from_args, parse_datetime};
use crate::output::{entry_json, print_totals};

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let mut service = ctx.open_service()?;

    let details = details_from_args(args)?;
    let mut new_entry = NewEntry::new(details);
    if let Some(value) = &args.date {
        let parsed = parse_datetime(value, service.calendar())?;
        new_entry = new_entry.with_created_at(parsed);
    }

    let (entry, totals) = service.create(&new_entry)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry_json(&entry, false)?)?);
    } else if !ctx.quiet() {
        println!("Added entry {}", entry.id);
        println!(
            "Counters: yearly {} | film {} | daily {}",
            entry.counters.yearly_count, entry.counters.film_number, entry.counters.daily_count
        );
        print_totals(&totals);
    }
    Ok(())
}
