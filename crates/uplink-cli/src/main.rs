//! Uplink CLI entrypoint.

use clap::Parser;

mod commands;
mod config;
mod handlers;

use commands::Commands;
use config::CliConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "uplink")]
#[command(author, version, about = "Satellite usage ingestion and billing cycles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => {
            let config = CliConfig::from_env()?;
            handlers::import(&config, args).await?
        }
        Commands::Plan(args) => handlers::plan(args)?,
        Commands::Recompute(args) => {
            let config = CliConfig::from_env()?;
            handlers::recompute(&config, args).await?
        }
    }

    Ok(())
}
