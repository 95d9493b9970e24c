//! Results-page retrieval with an on-disk cache.
//!
//! [`PageSource`] is the seam between the orchestrator and wherever pages
//! come from. [`ApiPageSource`] fetches `GET <base>/v1/results?...&page=N`
//! and keeps every raw response as `<cache_dir>/<prefix>_<N>.json`; a cached
//! page is reused without touching the network.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::download::{DownloadError, HttpClient, partial_path};

/// Errors that make a page unavailable for this run.
#[derive(Debug, Error)]
pub enum PageSourceError {
    /// The page request failed.
    #[error("failed to fetch page {index}: {source}")]
    Fetch {
        /// Page index.
        index: u32,
        /// Underlying HTTP error.
        #[source]
        source: DownloadError,
    },

    /// The cache file could not be read or written.
    #[error("page cache error at {path}: {source}")]
    Cache {
        /// Cache file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Something that can produce the raw bytes of results page `index`.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the raw page payload.
    ///
    /// # Errors
    ///
    /// Returns [`PageSourceError`] when the page is unavailable; the caller
    /// skips the page.
    async fn load_page(&self, index: u32) -> Result<Vec<u8>, PageSourceError>;
}

/// Query parameters of the upstream results endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEndpoint {
    /// Scheme and host, e.g. `https://api.example.com`.
    pub base_url: String,
    /// `locale` query parameter.
    pub locale: String,
    /// `limit` query parameter (results per page).
    pub limit: u32,
}

impl PageEndpoint {
    /// Default upstream host.
    pub const DEFAULT_BASE_URL: &'static str = "https://dss.wcms.basf.com";
    /// Default locale.
    pub const DEFAULT_LOCALE: &'static str = "en-US";
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 1000;

    /// Creates an endpoint with the default locale and limit.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            locale: Self::DEFAULT_LOCALE.to_string(),
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// URL of page `index`.
    #[must_use]
    pub fn page_url(&self, index: u32) -> String {
        format!(
            "{}/v1/results?locale={}&limit={}&page={index}",
            self.base_url.trim_end_matches('/'),
            self.locale,
            self.limit
        )
    }
}

impl Default for PageEndpoint {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

/// Page source backed by the upstream API and a local cache directory.
#[derive(Debug, Clone)]
pub struct ApiPageSource {
    client: HttpClient,
    endpoint: PageEndpoint,
    cache_dir: PathBuf,
    file_prefix: String,
}

impl ApiPageSource {
    /// Default cache file prefix.
    pub const DEFAULT_FILE_PREFIX: &'static str = "results";

    /// Creates a source that caches pages in `cache_dir`.
    #[must_use]
    pub fn new(client: HttpClient, endpoint: PageEndpoint, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            endpoint,
            cache_dir: cache_dir.into(),
            file_prefix: Self::DEFAULT_FILE_PREFIX.to_string(),
        }
    }

    /// Overrides the cache file prefix.
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Cache file for page `index`.
    #[must_use]
    pub fn cache_path(&self, index: u32) -> PathBuf {
        self.cache_dir
            .join(format!("{}_{index}.json", self.file_prefix))
    }

    async fn read_cache(path: &Path) -> Result<Option<Vec<u8>>, PageSourceError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Ok(None),
        }
        tokio::fs::read(path)
            .await
            .map(Some)
            .map_err(|e| PageSourceError::Cache {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

#[async_trait]
impl PageSource for ApiPageSource {
    #[instrument(skip(self))]
    async fn load_page(&self, index: u32) -> Result<Vec<u8>, PageSourceError> {
        let cache_path = self.cache_path(index);
        if let Some(cached) = Self::read_cache(&cache_path).await? {
            debug!(path = %cache_path.display(), "using cached page");
            return Ok(cached);
        }

        let url = self.endpoint.page_url(index);
        info!(%url, path = %cache_path.display(), "downloading page");
        let body = self
            .client
            .get_bytes(&url)
            .await
            .map_err(|source| PageSourceError::Fetch { index, source })?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| PageSourceError::Cache {
                path: self.cache_dir.clone(),
                source: e,
            })?;
        write_cache_file(&cache_path, &body).await?;
        debug!(bytes = body.len(), "page cached");
        Ok(body)
    }
}

/// Writes a cache file through a `.part` sibling so a reader never sees a
/// truncated page.
async fn write_cache_file(path: &Path, body: &[u8]) -> Result<(), PageSourceError> {
    let part_path = partial_path(path);
    let result = async {
        tokio::fs::write(&part_path, body).await?;
        tokio::fs::rename(&part_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(PageSourceError::Cache {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
