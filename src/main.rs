//! CLI entry point for catalog-fetch.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = args
        .into_run_config()
        .context("invalid configuration")?;
    info!(
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        "catalog-fetch starting"
    );

    let stats = catalog_fetch::run(&config).await.context("run aborted")?;

    info!(
        downloaded = stats.downloaded(),
        skipped = stats.skipped(),
        failed = stats.failed(),
        total = stats.dispatched(),
        "done"
    );

    Ok(())
}
