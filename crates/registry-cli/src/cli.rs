use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use registry_core::VERSION;

/// Registry - a numbered ledger of radiology clinic visits
#[derive(Parser)]
#[command(name = "registry")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the registry database
    #[arg(long, global = true, env = "REGISTRY_PATH")]
    pub db: Option<String>,

    /// Business timezone (IANA name, e.g. Asia/Tashkent)
    #[arg(long, global = true, value_name = "TZ")]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the registry database will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Entries per page for listings
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,
}

/// Coded and optional visit fields shared by `add` and `edit`
#[derive(Args)]
pub struct VisitFieldArgs {
    /// Address code ("other" to use --other-address)
    #[arg(long)]
    pub address: Option<String>,

    /// Free-text address when the code is "other"
    #[arg(long)]
    pub other_address: Option<String>,

    /// Job code ("other" to use --other-job)
    #[arg(long)]
    pub job: Option<String>,

    /// Free-text job when the code is "other"
    #[arg(long)]
    pub other_job: Option<String>,

    /// Visit reason code ("other" to use --other-visit-reason)
    #[arg(long)]
    pub visit_reason: Option<String>,

    /// Free-text visit reason when the code is "other"
    #[arg(long)]
    pub other_visit_reason: Option<String>,

    /// Radiology report code ("other" to use --other-radiology-report)
    #[arg(long)]
    pub radiology_report: Option<String>,

    /// Free-text radiology report when the code is "other"
    #[arg(long)]
    pub other_radiology_report: Option<String>,

    /// Contact phone number
    #[arg(long)]
    pub phone: Option<String>,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Patient full name
    #[arg(long)]
    pub name: String,

    /// Patient birth year
    #[arg(long)]
    pub birth_year: i32,

    /// Patient gender (male, female)
    #[arg(long)]
    pub gender: String,

    /// Radiation dose note
    #[arg(long)]
    pub dose: String,

    #[command(flatten)]
    pub fields: VisitFieldArgs,

    /// Record time (ISO-8601); defaults to now
    #[arg(long)]
    pub date: Option<String>,

    /// Output the created entry as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Entry ID (full UUID)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Patient full name
    #[arg(long)]
    pub name: Option<String>,

    /// Patient birth year
    #[arg(long)]
    pub birth_year: Option<i32>,

    /// Patient gender (male, female)
    #[arg(long)]
    pub gender: Option<String>,

    /// Radiation dose note
    #[arg(long)]
    pub dose: Option<String>,

    #[command(flatten)]
    pub fields: VisitFieldArgs,

    /// Output the updated entry as JSON
    #[arg(long)]
    pub json: bool,
}

/// Filters shared by `list` and `export`
#[derive(Args)]
pub struct FilterArgs {
    /// Case-insensitive text search across name, phone and coded fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// First local day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Last local day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    #[arg(long)]
    pub birth_year_from: Option<i32>,

    #[arg(long)]
    pub birth_year_to: Option<i32>,

    #[arg(long)]
    pub age_from: Option<i32>,

    #[arg(long)]
    pub age_to: Option<i32>,

    /// Gender (male, female)
    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub other_address: Option<String>,

    #[arg(long)]
    pub job: Option<String>,

    #[arg(long)]
    pub other_job: Option<String>,

    #[arg(long)]
    pub visit_reason: Option<String>,

    #[arg(long)]
    pub other_visit_reason: Option<String>,

    #[arg(long)]
    pub radiology_report: Option<String>,

    #[arg(long)]
    pub other_radiology_report: Option<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<usize>,

    /// Entries per page
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Entry ID (full UUID)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Entry ID (must be the most recent entry)
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output format (json, jsonl)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Include display labels for coded fields
    #[arg(long)]
    pub resolved: bool,
}

/// Arguments for the `backup` command
#[derive(Args)]
pub struct BackupArgs {
    /// Destination path
    #[arg(value_name = "DEST")]
    pub destination: String,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new registry database and write the config
    Init(InitArgs),

    /// Record a new visit
    Add(AddArgs),

    /// Change the details of a recorded visit (counters never change)
    Edit(EditArgs),

    /// List visits, newest first
    List(ListArgs),

    /// Show a specific visit by ID
    Show(ShowArgs),

    /// Delete the most recent visit
    Delete(DeleteArgs),

    /// Export visits, oldest first
    Export(ExportArgs),

    /// Check database and counter integrity
    Check,

    /// Back up the registry database
    Backup(BackupArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
