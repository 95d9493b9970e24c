//! Document fetching: HTTP, validation, local naming and retry decisions.
//!
//! # Features
//!
//! - PDF-only acceptance (`Content-Type` must contain `application/pdf`)
//! - Streaming bodies to a `.part` file, renamed into place when complete
//! - Deterministic, filesystem-safe local filenames
//! - Bounded per-request timeout (1 minute by default)
//! - One retry after a fixed cooldown for HTTP 429
//!
//! # Example
//!
//! ```no_run
//! use docharvest_core::download::{FetchOutcome, HttpClient, ItemFetcher};
//! use docharvest_core::{DownloadItem, Ledger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ledger = Ledger::open("download.txt").await?;
//! let fetcher = ItemFetcher::new(HttpClient::new(), "PDFs");
//! let item = DownloadItem::new("https://example.com/paper.pdf", "paper.pdf");
//! if let FetchOutcome::Success { path, .. } = fetcher.fetch(&item, &mut ledger).await {
//!     println!("Downloaded: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod fetcher;
mod filename;
mod retry;

pub use client::{HttpClient, PDF_CONTENT_TYPE, write_body_to_file};
pub use error::{DownloadError, TOO_MANY_REQUESTS};
pub use fetcher::{FetchOutcome, ItemFetcher, SkipReason, partial_path};
pub use filename::{PDF_EXTENSION, local_filename, normalize_name};
pub use retry::{FailureType, RATE_LIMITED_MAX_ATTEMPTS, RetryDecision, RetryPolicy, classify_error};
