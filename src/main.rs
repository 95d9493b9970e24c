//! CLI entry point for the docharvest tool.

use anyhow::{Context, Result};
use clap::Parser;
use docharvest_core::{Harvester, Ledger};
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{load_file_config, resolve_harvest_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let file_config = load_file_config(args.config.as_deref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config
                .as_ref()
                .and_then(|cfg| cfg.verbosity)
                .map_or("info", |v| v.filter_directive()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    let config = resolve_harvest_config(&args, file_config.as_ref());
    info!(
        output_dir = %config.output_dir.display(),
        ledger = %config.ledger_path.display(),
        max_page_index = config.max_page_index,
        "Docharvest starting"
    );

    let mut ledger = Ledger::open(&config.ledger_path)
        .await
        .with_context(|| format!("Failed to open ledger '{}'", config.ledger_path.display()))?;

    let harvester = Harvester::from_config(&config);
    let stats = harvester.run(&mut ledger).await?;

    info!(
        downloaded = stats.downloaded(),
        skipped = stats.skipped_logged() + stats.skipped_existing(),
        failed = stats.failed(),
        pages_skipped = stats.pages_skipped(),
        ledger_entries = ledger.len(),
        "Harvest complete"
    );

    Ok(())
}
