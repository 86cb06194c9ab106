//! CLI command definitions.

use chrono::NaiveDate;
use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Run a historical usage import.
    Import(ImportArgs),
    /// Show the fetch windows an import would use, without fetching.
    Plan(PlanArgs),
    /// Recompute billing cycles from stored usage, without fetching.
    Recompute(RecomputeArgs),
}

#[derive(Args)]
pub struct ImportArgs {
    /// Terminal to import; repeatable. All active terminals when omitted.
    #[arg(long = "terminal")]
    pub terminals: Vec<String>,

    /// First day of the import range (YYYY-MM-DD).
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the import range; defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Days per provider call.
    #[arg(long)]
    pub chunk_days: Option<u32>,

    /// Retry attempts for rate-limited and transient failures.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Terminals processed concurrently.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print the job report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long)]
    pub start: NaiveDate,

    #[arg(long)]
    pub end: NaiveDate,

    #[arg(long)]
    pub chunk_days: Option<u32>,
}

#[derive(Args)]
pub struct RecomputeArgs {
    #[arg(long)]
    pub terminal: String,

    #[arg(long)]
    pub start: NaiveDate,

    #[arg(long)]
    pub end: NaiveDate,
}
