//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Mirror the PDF documents of a paginated results API into a local folder.
///
/// Pages are processed in order, each item is fetched at most once per run,
/// and an append-only ledger makes repeated runs incremental.
#[derive(Parser, Debug)]
#[command(name = "docharvest")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Highest page index to process (pages 0..=N) [default: 75]
    #[arg(short = 'p', long = "pages", value_name = "N")]
    pub max_page_index: Option<u32>,

    /// Directory downloaded documents are written into [default: PDFs]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Download ledger file [default: download.txt]
    #[arg(long = "ledger", value_name = "FILE")]
    pub ledger_path: Option<PathBuf>,

    /// Directory for cached result pages [default: .]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// File name prefix of cached pages (<PREFIX>_<N>.json) [default: results]
    #[arg(long, value_name = "PREFIX")]
    pub cache_prefix: Option<String>,

    /// Base URL of the results API
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Pause after HTTP 429 before the single retry, in seconds (0-3600) [default: 180]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub cooldown_secs: Option<u64>,

    /// Per-request timeout in seconds (1-3600) [default: 60]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: Option<u64>,

    /// Config file to load instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
