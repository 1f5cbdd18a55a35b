//! Registry CLI - a numbered ledger of radiology clinic visits
//!
//! This is the command-line interface for Registry. It parses arguments,
//! loads configuration, and maps core errors to exit codes.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use registry_core::{RegistryError, VERSION};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::errors::CliError;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "REGISTRY_LOG";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Some(Commands::Init(args)) => commands::handle_init(&ctx, args),
        Some(Commands::Add(args)) => commands::handle_add(&ctx, args),
        Some(Commands::Edit(args)) => commands::handle_edit(&ctx, args),
        Some(Commands::List(args)) => commands::handle_list(&ctx, args),
        Some(Commands::Show(args)) => commands::handle_show(&ctx, args),
        Some(Commands::Delete(args)) => commands::handle_delete(&ctx, args),
        Some(Commands::Export(args)) => commands::handle_export(&ctx, args),
        Some(Commands::Check) => commands::handle_check(&ctx),
        Some(Commands::Backup(args)) => commands::handle_backup(&ctx, args),
        Some(Commands::Completions(args)) => commands::handle_completions(args.shell),
        None => {
            println!("Registry v{}", VERSION);
            println!("\nRun `registry --help` for usage information.");
            Ok(())
        }
    }
}

/// Print the error and exit with the code its kind maps to.
fn exit_with(err: anyhow::Error) -> ! {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        cli_err.exit()
    }
    if let Some(mapped) = err
        .downcast_ref::<RegistryError>()
        .and_then(CliError::from_registry)
    {
        mapped.exit()
    }
    eprintln!("Error: {:#}", err);
    std::process::exit(1)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        exit_with(err)
    }
}
