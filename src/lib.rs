//! Docharvest Core Library
//!
//! Walks a paginated results API, collects the PDF links of every page and
//! mirrors them into a flat local directory. An append-only ledger remembers
//! what was already fetched, so repeated runs only download what is new.
//!
//! # Architecture
//!
//! - [`parser`] - Results page parsing and download URL validation
//! - [`download`] - HTTP fetching, local filenames, 429 retry policy
//! - [`ledger`] - Append-only record of completed downloads
//! - [`crawl`] - Page source and the sequential harvest loop
//! - [`config`] - Resolved run settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod crawl;
pub mod download;
pub mod ledger;
pub mod parser;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::HarvestConfig;
pub use crawl::{
    ApiPageSource, HarvestError, Harvester, PageEndpoint, PageSource, PageSourceError, RunStats,
};
pub use download::{
    DownloadError, FailureType, FetchOutcome, HttpClient, ItemFetcher, RetryDecision,
    RetryPolicy, SkipReason, classify_error, local_filename,
};
pub use ledger::{Ledger, LedgerError};
pub use parser::{DownloadItem, ParseError, extract_download_items, validate_download_url};
