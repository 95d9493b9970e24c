//! Durable, append-only record of completed downloads.
//!
//! The ledger file holds one line per completed item, `"<url> → <path>"`.
//! At startup the whole file is read into a set of URLs, so "was this
//! already fetched?" is a hash lookup. Entries are never rewritten or
//! removed; recording a URL twice simply appends a second line.
//!
//! # Example
//!
//! ```no_run
//! use docharvest_core::Ledger;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ledger = Ledger::open("download.txt").await?;
//! if !ledger.contains("https://example.com/a.pdf") {
//!     ledger.record("https://example.com/a.pdf", Path::new("PDFs/a.pdf")).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

pub use error::LedgerError;

/// Separator between URL and local path on each ledger line.
pub const LEDGER_SEPARATOR: &str = " → ";

/// In-memory view of the ledger file plus the handle to append to it.
///
/// Owned by the single run loop and passed by `&mut` into the fetcher; it is
/// not meant to be shared across tasks.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    urls: HashSet<String>,
}

impl Ledger {
    /// Loads the ledger at `path`.
    ///
    /// A missing file is an empty ledger. Invalid UTF-8 is replaced rather
    /// than rejected so one damaged line cannot hide the rest.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Read`] if the file exists but cannot be read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let urls = match tokio::fs::read(&path).await {
            Ok(bytes) => parse_ledger(&String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no ledger file yet, starting empty");
                HashSet::new()
            }
            Err(e) => return Err(LedgerError::read(path, e)),
        };

        info!(urls = urls.len(), "loaded download ledger");
        Ok(Self { path, urls })
    }

    /// Returns true if `url` has been recorded, in this run or an earlier one.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Appends `url → local_path` to the ledger file, then remembers the URL.
    ///
    /// The line is flushed and synced before the in-memory set changes, so
    /// the set never claims more than the file holds.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Append`] if the file cannot be opened or written.
    #[instrument(skip(self, local_path), fields(path = %local_path.display()))]
    pub async fn record(&mut self, url: &str, local_path: &Path) -> Result<(), LedgerError> {
        let line = format!("{}\n", format_entry(url, local_path));

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| LedgerError::append(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| LedgerError::append(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| LedgerError::append(&self.path, e))?;
        file.sync_data()
            .await
            .map_err(|e| LedgerError::append(&self.path, e))?;

        self.urls.insert(url.to_string());
        debug!("ledger entry recorded");
        Ok(())
    }

    /// Number of distinct URLs recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Formats one ledger line (without the trailing newline).
#[must_use]
pub fn format_entry(url: &str, local_path: &Path) -> String {
    format!("{url}{LEDGER_SEPARATOR}{}", local_path.display())
}

/// Returns the URL part of a ledger line, or `None` for a blank line.
///
/// A line without the separator is taken whole as a URL.
#[must_use]
pub fn parse_entry_url(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return None;
    }
    let url = line
        .split_once(LEDGER_SEPARATOR)
        .map_or(line, |(url, _)| url);
    Some(url)
}

fn parse_ledger(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .filter_map(parse_entry_url)
        .map(str::to_string)
        .collect()
}
