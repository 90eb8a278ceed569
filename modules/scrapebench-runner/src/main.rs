use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod coordinator;

#[derive(Parser)]
#[command(
    name = "scrapebench",
    about = "Benchmark web-content-retrieval engines against ground-truth tasks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one engine through a suite.
    Run(commands::RunArgs),
    /// Run every registered engine, one isolated process each.
    RunAll(coordinator::RunAllArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run(args) => commands::run(args).await,
        Command::RunAll(args) => coordinator::run_all(args).await,
    }
}
