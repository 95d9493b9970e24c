//! Error types for the download module.
//!
//! Each variant corresponds to one way a single item fetch can fail. None of
//! them is fatal to a run; the orchestrator logs the error and moves on,
//! except for HTTP 429 which earns one retry after a cooldown.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::LedgerError;

/// HTTP status the upstream uses to signal rate limiting.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Errors that can occur while fetching one document.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Server answered with something other than 200 OK.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response was not a PDF; the body was discarded.
    #[error("invalid content type for {url}: '{content_type}' (expected application/pdf)")]
    WrongContentType {
        /// The URL that returned the wrong type.
        url: String,
        /// The Content-Type header value (empty when missing).
        content_type: String,
    },

    /// The body stream failed part way through.
    #[error("failed to read body from {url}: {source}")]
    Read {
        /// The URL whose body could not be read.
        url: String,
        /// The underlying stream error.
        #[source]
        source: reqwest::Error,
    },

    /// The server sent a zero-length body; no file was created.
    #[error("downloaded 0 bytes for {url}, not creating file")]
    EmptyBody {
        /// The URL that returned an empty body.
        url: String,
    },

    /// Local file creation, write, or rename failed.
    #[error("IO error writing to {path}: {source}")]
    Write {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file was written but its ledger entry could not be appended.
    ///
    /// The next run heals this through the file-exists path.
    #[error("downloaded {url} but could not record it: {source}")]
    Ledger {
        /// The URL whose entry was not recorded.
        url: String,
        /// The underlying ledger error.
        #[source]
        source: LedgerError,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a wrong content type error.
    pub fn wrong_content_type(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::WrongContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a body read error.
    pub fn read(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Read {
            url: url.into(),
            source,
        }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Creates a local write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a ledger append error.
    pub fn ledger(url: impl Into<String>, source: LedgerError) -> Self {
        Self::Ledger {
            url: url.into(),
            source,
        }
    }

    /// Returns the HTTP status if this is an [`DownloadError::HttpStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the server signalled rate limiting (HTTP 429).
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(TOO_MANY_REQUESTS)
    }

    /// Short stable label for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::WrongContentType { .. } => "wrong_content_type",
            Self::Read { .. } => "read",
            Self::EmptyBody { .. } => "empty_body",
            Self::Write { .. } => "write",
            Self::Ledger { .. } => "ledger",
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the url
// or path, which the source errors don't carry.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://example.com/file.pdf");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/file.pdf"));
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/file.pdf"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_rate_limited_only_for_429() {
        assert!(DownloadError::http_status("https://a/b.pdf", 429).is_rate_limited());
        assert!(!DownloadError::http_status("https://a/b.pdf", 503).is_rate_limited());
        assert!(!DownloadError::empty_body("https://a/b.pdf").is_rate_limited());
        assert!(!DownloadError::timeout("https://a/429.pdf").is_rate_limited());
    }

    #[test]
    fn test_download_error_wrong_content_type_display() {
        let msg = DownloadError::wrong_content_type("https://a/b.pdf", "text/html").to_string();
        assert!(msg.contains("text/html"), "Expected content type in: {msg}");
        assert!(msg.contains("application/pdf"), "Expected hint in: {msg}");
    }

    #[test]
    fn test_download_error_write_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::write(PathBuf::from("/tmp/test.pdf"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test.pdf"), "Expected path in: {msg}");
        assert_eq!(error.kind(), "write");
    }

    #[test]
    fn test_download_error_empty_body_display() {
        let msg = DownloadError::empty_body("https://a/b.pdf").to_string();
        assert!(msg.contains("0 bytes"), "got: {msg}");
    }
}
