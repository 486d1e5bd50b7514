//! monty CLI

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "monty", version, about = "Review and auto-merge bot for GitHub pull requests")]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync pull requests of the configured repositories into the store
    Sync,

    /// Evaluate every open pull request and print the results
    Review {
        /// Print reviews as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate open pull requests and merge the ones that pass
    Merge {
        /// Show what would be merged without making changes
        #[arg(long)]
        dry_run: bool,

        /// Preview the plan and prompt before merging
        #[arg(long)]
        confirm: bool,
    },

    /// Sync, review and merge repeatedly until interrupted
    Run {
        /// Seconds between cycles
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "monty=info",
        1 => "monty=debug",
        _ => "monty=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = cli::CommandContext::new(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Sync => cli::run_sync(&ctx).await?,
        Commands::Review { json } => cli::run_review(&ctx, json).await?,
        Commands::Merge { dry_run, confirm } => {
            cli::run_merge(&ctx, cli::MergeCommandOptions { dry_run, confirm }).await?;
        }
        Commands::Run { interval } => {
            cli::run_loop(&ctx, std::time::Duration::from_secs(interval.max(1))).await?;
        }
    }

    Ok(())
}
