//! HTTP client wrapper for page and document requests.
//!
//! This module provides the `HttpClient` struct which owns the timeout
//! configuration and turns HTTP responses into [`DownloadError`]s: non-200
//! statuses, non-PDF content types and body failures each get their own
//! variant.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Media type every downloaded document must declare.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// HTTP client for fetching results pages and PDF documents.
///
/// Created once per run and reused so connections are pooled. Every request
/// is bounded by the request timeout; there is no other cancellation.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Request timeout: 1 minute
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, request_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Sends one GET and returns the response if it is a 200 carrying a PDF.
    ///
    /// The body is not read; callers stream it with [`write_body_to_file`].
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails or times out
    /// - The server returns any status other than 200
    /// - The `Content-Type` header does not contain `application/pdf`
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_pdf(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self.send_get(url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.to_ascii_lowercase().contains(PDF_CONTENT_TYPE) {
            debug!(%content_type, "rejecting non-PDF response");
            return Err(DownloadError::wrong_content_type(url, content_type));
        }

        Ok(response)
    }

    /// Sends one GET and reads the whole body of a 200 response into memory.
    ///
    /// Used for results pages, which are small JSON documents.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` for transport failures, non-200 statuses and
    /// body read failures.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.send_get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| DownloadError::read(url, e))?;
        Ok(body.to_vec())
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "unexpected status");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

/// Streams a response body to `file_path`, returning bytes written.
///
/// The file is created only once the first non-empty chunk arrives, so an
/// empty body leaves nothing on disk and returns `Ok(0)`. On error the caller
/// is responsible for removing whatever was written.
///
/// # Errors
///
/// Returns [`DownloadError::Read`] (or `Timeout`) when the body stream fails
/// and [`DownloadError::Write`] when the file cannot be created or written.
pub async fn write_body_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut stream = response.bytes_stream();
    let mut writer: Option<BufWriter<File>> = None;
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::read(url, e)
            }
        })?;
        if chunk.is_empty() {
            continue;
        }

        if writer.is_none() {
            let file = File::create(file_path)
                .await
                .map_err(|e| DownloadError::write(file_path, e))?;
            writer = Some(BufWriter::new(file));
        }
        if let Some(out) = writer.as_mut() {
            out.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::write(file_path, e))?;
        }

        bytes_written += chunk.len() as u64;
    }

    if let Some(mut out) = writer {
        out.flush()
            .await
            .map_err(|e| DownloadError::write(file_path, e))?;
        out.get_ref()
            .sync_all()
            .await
            .map_err(|e| DownloadError::write(file_path, e))?;
    }

    Ok(bytes_written)
}
