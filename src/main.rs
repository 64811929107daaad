mod commands;
mod config;
mod fetch;
mod x;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{AnnounceConfig, ScheduleConfig};

#[derive(Parser)]
#[command(name = "streamcal")]
#[command(about = "Build a stream schedule from a calendar feed and announce the next stream")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the calendar feed and write the schedule JSON
    Schedule(ScheduleConfig),
    /// Announce the next upcoming stream on X, once per event
    Announce(AnnounceConfig),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Values from .env only fill in what the environment does not set
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streamcal=info,streamcal_core=info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Schedule(config) => commands::schedule::run(config).await,
        Commands::Announce(config) => commands::announce::run(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
