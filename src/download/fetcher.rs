//! Single-item fetch with ledger bookkeeping.
//!
//! [`ItemFetcher::fetch`] is the only place a document is written to the
//! output directory. Side effects happen in a fixed order: the body lands in
//! a `.part` file, is renamed into place, and only then is the URL appended to
//! the ledger. A crash at any point leaves either no final file, or a final
//! file without a ledger line (healed on the next run by the file-exists path),
//! never a ledger line pointing at a missing or partial file.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::client::{HttpClient, write_body_to_file};
use super::constants::PARTIAL_SUFFIX;
use super::error::DownloadError;
use super::filename::local_filename;
use crate::ledger::Ledger;
use crate::parser::DownloadItem;

/// Why an item was not fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The ledger already records the URL; no I/O was done.
    AlreadyLogged,
    /// The target file already exists on disk; the ledger was updated.
    FileExists,
}

impl SkipReason {
    /// Stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyLogged => "already-logged",
            Self::FileExists => "file-exists",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one fetch attempt. Drives orchestrator control flow; never persisted.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The document was downloaded and recorded.
    Success {
        /// Bytes written to disk.
        bytes_written: u64,
        /// Final local path.
        path: PathBuf,
    },
    /// Nothing was downloaded.
    Skipped(SkipReason),
    /// The attempt failed; the URL is not in the ledger.
    Failed(DownloadError),
}

impl FetchOutcome {
    /// Returns the error of a failed outcome.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Fetches single items into a flat output directory.
#[derive(Debug, Clone)]
pub struct ItemFetcher {
    client: HttpClient,
    output_dir: PathBuf,
}

impl ItemFetcher {
    /// Creates a fetcher writing into `output_dir`.
    #[must_use]
    pub fn new(client: HttpClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Directory documents are written into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Local path an item is (or would be) stored at.
    #[must_use]
    pub fn local_path(&self, item: &DownloadItem) -> PathBuf {
        self.output_dir
            .join(local_filename(&item.url, &item.suggested_name))
    }

    /// Fetches one item, leaving disk and ledger consistent.
    ///
    /// 1. Ledger already has the URL: `Skipped(AlreadyLogged)`, no I/O.
    /// 2. Target file exists: record it, `Skipped(FileExists)`.
    /// 3. Otherwise one GET; the body must be a non-empty PDF. It is written,
    ///    then recorded, then `Success` is returned.
    #[instrument(skip(self, item, ledger), fields(url = %item.url))]
    pub async fn fetch(&self, item: &DownloadItem, ledger: &mut Ledger) -> FetchOutcome {
        let path = self.local_path(item);

        if ledger.contains(&item.url) {
            debug!("URL already logged as downloaded, skipping");
            return FetchOutcome::Skipped(SkipReason::AlreadyLogged);
        }

        if is_existing_file(&path).await {
            info!(path = %path.display(), "file already exists locally, recording in ledger");
            if let Err(e) = ledger.record(&item.url, &path).await {
                return FetchOutcome::Failed(DownloadError::ledger(&item.url, e));
            }
            return FetchOutcome::Skipped(SkipReason::FileExists);
        }

        let bytes_written = match self.download(&item.url, &path).await {
            Ok(bytes) => bytes,
            Err(e) => return FetchOutcome::Failed(e),
        };

        if let Err(e) = ledger.record(&item.url, &path).await {
            warn!(path = %path.display(), error = %e, "file written but ledger append failed");
            return FetchOutcome::Failed(DownloadError::ledger(&item.url, e));
        }

        info!(bytes = bytes_written, path = %path.display(), "download complete");
        FetchOutcome::Success {
            bytes_written,
            path,
        }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get_pdf(url).await?;
        let part_path = partial_path(path);

        let bytes_written = match write_body_to_file(response, url, &part_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(e);
            }
        };

        if bytes_written == 0 {
            return Err(DownloadError::empty_body(url));
        }

        if let Err(e) = tokio::fs::rename(&part_path, path).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(DownloadError::write(path, e));
        }

        Ok(bytes_written)
    }
}

/// Sibling temp path a body is streamed into before the final rename.
#[must_use]
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

async fn is_existing_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}
