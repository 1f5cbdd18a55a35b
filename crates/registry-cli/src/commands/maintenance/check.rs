use crate::app::AppContext;
use crate::errors::CliError;

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let report = match service.verify() {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Integrity check: FAILED");
            eprintln!("- error: {}", err);
            return Err(CliError::integrity_failed("Integrity check failed").into());
        }
    };

    if !report.is_clean() {
        eprintln!("Integrity check: FAILED");
        for violation in &report.violations {
            eprintln!("- {}", violation);
        }
        return Err(CliError::integrity_failed(format!(
            "{} violation(s) in {} entries",
            report.violations.len(),
            report.checked
        ))
        .into());
    }

    if !ctx.quiet() {
        println!("Integrity check: OK");
        println!("- sqlite: OK");
        println!("- metadata keys: OK");
        println!("- counters: OK ({} entries)", report.checked);
    }
    Ok(())
}
