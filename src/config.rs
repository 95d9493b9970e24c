//! Resolved settings for one harvest run.

use std::path::PathBuf;
use std::time::Duration;

use crate::crawl::{ApiPageSource, PageEndpoint};
use crate::download::constants::{DEFAULT_RATE_LIMIT_COOLDOWN, REQUEST_TIMEOUT_SECS};

/// Default output directory for downloaded documents.
pub const DEFAULT_OUTPUT_DIR: &str = "PDFs";

/// Default ledger file name.
pub const DEFAULT_LEDGER_PATH: &str = "download.txt";

/// Default directory for cached result pages.
pub const DEFAULT_CACHE_DIR: &str = ".";

/// Default highest page index (inclusive).
pub const DEFAULT_MAX_PAGE_INDEX: u32 = 75;

/// Everything a [`crate::Harvester`] needs, after CLI and config file merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Flat directory documents are written into.
    pub output_dir: PathBuf,
    /// Append-only download ledger.
    pub ledger_path: PathBuf,
    /// Directory holding `<cache_prefix>_<N>.json` page caches.
    pub cache_dir: PathBuf,
    /// File name prefix of cached pages.
    pub cache_prefix: String,
    /// Upstream API base URL.
    pub base_url: String,
    /// Pages `0..=max_page_index` are processed.
    pub max_page_index: u32,
    /// Pause after an HTTP 429 before the single retry.
    pub cooldown: Duration,
    /// Whole-request timeout for page and document fetches.
    pub request_timeout: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_prefix: ApiPageSource::DEFAULT_FILE_PREFIX.to_string(),
            base_url: PageEndpoint::DEFAULT_BASE_URL.to_string(),
            max_page_index: DEFAULT_MAX_PAGE_INDEX,
            cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = HarvestConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("PDFs"));
        assert_eq!(config.ledger_path, PathBuf::from("download.txt"));
        assert_eq!(config.cache_dir, PathBuf::from("."));
        assert_eq!(config.cache_prefix, "results");
        assert_eq!(config.max_page_index, 75);
        assert_eq!(config.cooldown, Duration::from_secs(180));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }
}
