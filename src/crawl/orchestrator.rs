//! Page-by-page harvest loop.
//!
//! [`Harvester::run`] walks pages `0..=max_page_index` in order, extracts the
//! download items of each page and fetches them one at a time. Nothing here
//! runs concurrently: a rate-limit cooldown blocks the whole run, and items
//! are fetched in extraction order.
//!
//! Failures never abort the run. An unavailable or malformed page is skipped;
//! a failed item is logged and left out of the ledger so the next run picks
//! it up again. HTTP 429 is the one failure retried in-run, once, after the
//! configured cooldown.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::error::HarvestError;
use super::page_source::{ApiPageSource, PageEndpoint, PageSource};
use crate::config::HarvestConfig;
use crate::download::constants::CONNECT_TIMEOUT_SECS;
use crate::download::{
    FetchOutcome, HttpClient, ItemFetcher, RetryDecision, RetryPolicy, SkipReason, classify_error,
};
use crate::ledger::Ledger;
use crate::parser::{DownloadItem, extract_download_items};

/// Counters for one run, logged as a summary at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pages_processed: u64,
    pages_skipped: u64,
    items_seen: u64,
    downloaded: u64,
    bytes_downloaded: u64,
    skipped_logged: u64,
    skipped_existing: u64,
    failed: u64,
    rate_limit_cooldowns: u64,
    retries: u64,
}

impl RunStats {
    /// Pages whose items were processed.
    #[must_use]
    pub fn pages_processed(&self) -> u64 {
        self.pages_processed
    }

    /// Pages that could not be loaded or parsed.
    #[must_use]
    pub fn pages_skipped(&self) -> u64 {
        self.pages_skipped
    }

    /// Unique valid items extracted across all pages, before run-level dedup.
    #[must_use]
    pub fn items_seen(&self) -> u64 {
        self.items_seen
    }

    /// Documents downloaded and recorded.
    #[must_use]
    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Total bytes written for downloaded documents.
    #[must_use]
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    /// Items skipped because the ledger already had them.
    #[must_use]
    pub fn skipped_logged(&self) -> u64 {
        self.skipped_logged
    }

    /// Items skipped because the file was already on disk.
    #[must_use]
    pub fn skipped_existing(&self) -> u64 {
        self.skipped_existing
    }

    /// Items abandoned for this run.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Cooldown pauses taken after HTTP 429.
    #[must_use]
    pub fn rate_limit_cooldowns(&self) -> u64 {
        self.rate_limit_cooldowns
    }

    /// Fetch attempts beyond the first.
    #[must_use]
    pub fn retries(&self) -> u64 {
        self.retries
    }

    fn record_outcome(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Success { bytes_written, .. } => {
                self.downloaded += 1;
                self.bytes_downloaded += bytes_written;
            }
            FetchOutcome::Skipped(SkipReason::AlreadyLogged) => self.skipped_logged += 1,
            FetchOutcome::Skipped(SkipReason::FileExists) => self.skipped_existing += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Sequential page orchestrator.
pub struct Harvester {
    source: Box<dyn PageSource>,
    fetcher: ItemFetcher,
    policy: RetryPolicy,
    max_page_index: u32,
}

impl Harvester {
    /// Creates a harvester over pages `0..=max_page_index`.
    #[must_use]
    pub fn new(
        source: Box<dyn PageSource>,
        fetcher: ItemFetcher,
        policy: RetryPolicy,
        max_page_index: u32,
    ) -> Self {
        Self {
            source,
            fetcher,
            policy,
            max_page_index,
        }
    }

    /// Builds the production wiring: upstream API pages, one shared HTTP client.
    #[must_use]
    pub fn from_config(config: &HarvestConfig) -> Self {
        let request_secs = config.request_timeout.as_secs().max(1);
        let client = HttpClient::new_with_timeouts(
            CONNECT_TIMEOUT_SECS.min(request_secs),
            request_secs,
        );
        let source = ApiPageSource::new(
            client.clone(),
            PageEndpoint::new(config.base_url.clone()),
            config.cache_dir.clone(),
        )
        .with_file_prefix(config.cache_prefix.clone());
        Self::new(
            Box::new(source),
            ItemFetcher::new(client, config.output_dir.clone()),
            RetryPolicy::new(config.cooldown),
            config.max_page_index,
        )
    }

    /// Runs the whole harvest.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::OutputDir`] if the output directory cannot be
    /// created. Page and item failures are counted, not returned.
    #[instrument(skip(self, ledger), fields(max_page_index = self.max_page_index))]
    pub async fn run(&self, ledger: &mut Ledger) -> Result<RunStats, HarvestError> {
        ensure_output_dir(self.fetcher.output_dir()).await?;

        let mut stats = RunStats::default();
        let mut attempted: HashSet<String> = HashSet::new();

        for index in 0..=self.max_page_index {
            let items = match self.load_items(index).await {
                Some(items) => items,
                None => {
                    stats.pages_skipped += 1;
                    continue;
                }
            };
            stats.pages_processed += 1;
            stats.items_seen += items.len() as u64;
            info!(page = index, items = items.len(), "processing page");

            for item in &items {
                if !attempted.insert(item.url.clone()) {
                    debug!(url = %item.url, "already handled earlier in this run");
                    continue;
                }
                let outcome = self.fetch_with_retry(item, ledger, &mut stats).await;
                if let FetchOutcome::Failed(e) = &outcome {
                    warn!(url = %item.url, kind = e.kind(), error = %e, "giving up on item for this run");
                }
                stats.record_outcome(&outcome);
            }
        }

        info!(
            pages_processed = stats.pages_processed,
            pages_skipped = stats.pages_skipped,
            downloaded = stats.downloaded,
            bytes = stats.bytes_downloaded,
            skipped_logged = stats.skipped_logged,
            skipped_existing = stats.skipped_existing,
            failed = stats.failed,
            rate_limit_cooldowns = stats.rate_limit_cooldowns,
            "harvest finished"
        );
        Ok(stats)
    }

    async fn load_items(&self, index: u32) -> Option<Vec<DownloadItem>> {
        let raw = match self.source.load_page(index).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(page = index, error = %e, "page unavailable, skipping");
                return None;
            }
        };
        match extract_download_items(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(page = index, error = %e, "page could not be parsed, skipping");
                None
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        item: &DownloadItem,
        ledger: &mut Ledger,
        stats: &mut RunStats,
    ) -> FetchOutcome {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let outcome = self.fetcher.fetch(item, ledger).await;
            let Some(failure_type) = outcome.error().map(classify_error) else {
                return outcome;
            };

            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        url = %item.url,
                        attempt = next_attempt,
                        cooldown_secs = delay.as_secs_f64(),
                        "rate limited, pausing before retry"
                    );
                    stats.rate_limit_cooldowns += 1;
                    stats.retries += 1;
                    cooldown(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url = %item.url, %reason, "not retrying");
                    return outcome;
                }
            }
        }
    }
}

async fn cooldown(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

async fn ensure_output_dir(path: &Path) -> Result<(), HarvestError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder
        .create(path)
        .await
        .map_err(|e| HarvestError::output_dir(path, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::crawl::PageSourceError;
    use crate::download::DownloadError;
    use crate::test_support::socket_guard::start_mock_server_or_skip;

    /// In-memory pages; missing indices fail like an unreachable page.
    struct StaticPages(HashMap<u32, String>);

    #[async_trait]
    impl PageSource for StaticPages {
        async fn load_page(&self, index: u32) -> Result<Vec<u8>, PageSourceError> {
            self.0
                .get(&index)
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| PageSourceError::Fetch {
                    index,
                    source: DownloadError::http_status("https://pages.invalid", 404),
                })
        }
    }

    fn page_json(entries: &[(&str, &str)]) -> String {
        let variants: Vec<String> = entries
            .iter()
            .map(|(url, name)| format!(r#"{{"downloadUrl":"{url}","fileName":"{name}"}}"#))
            .collect();
        format!(r#"{{"results":[{{"variants":[{}]}}]}}"#, variants.join(","))
    }

    fn harvester(pages: HashMap<u32, String>, output: &Path, max_page_index: u32) -> Harvester {
        Harvester::new(
            Box::new(StaticPages(pages)),
            ItemFetcher::new(HttpClient::new(), output),
            RetryPolicy::new(Duration::from_millis(10)),
            max_page_index,
        )
    }

    async fn mount_pdf(server: &MockServer, route: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_skips_missing_and_malformed_pages() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("PDFs");
        let mut ledger = Ledger::open(temp_dir.path().join("download.txt")).await.unwrap();

        let mut pages = HashMap::new();
        pages.insert(0, "not json".to_string());
        pages.insert(2, r#"{"results":[]}"#.to_string());

        let stats = harvester(pages, &output, 2).run(&mut ledger).await.unwrap();

        assert_eq!(stats.pages_processed(), 1);
        assert_eq!(stats.pages_skipped(), 2);
        assert!(output.is_dir(), "output directory is created up front");
    }

    #[tokio::test]
    async fn test_run_fetches_cross_page_duplicate_once() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/shared.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("PDFs");
        let mut ledger = Ledger::open(temp_dir.path().join("download.txt")).await.unwrap();

        let url = format!("{}/shared.pdf", mock_server.uri());
        let mut pages = HashMap::new();
        pages.insert(0, page_json(&[(&url, "Shared.pdf")]));
        pages.insert(1, page_json(&[(&url, "Shared Copy.pdf")]));

        let stats = harvester(pages, &output, 1).run(&mut ledger).await.unwrap();

        assert_eq!(stats.items_seen(), 2);
        assert_eq!(stats.downloaded(), 1);
        assert_eq!(stats.bytes_downloaded(), 8);
        assert!(output.join("shared.pdf").is_file());
        assert!(!output.join("shared_copy.pdf").exists());
    }

    #[tokio::test]
    async fn test_rate_limited_item_retried_once_then_succeeds() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/busy.pdf"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
        mount_pdf(&mock_server, "/busy.pdf").await;

        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("PDFs");
        let mut ledger = Ledger::open(temp_dir.path().join("download.txt")).await.unwrap();

        let url = format!("{}/busy.pdf", mock_server.uri());
        let mut pages = HashMap::new();
        pages.insert(0, page_json(&[(&url, "busy.pdf")]));

        let stats = harvester(pages, &output, 0).run(&mut ledger).await.unwrap();

        assert_eq!(stats.rate_limit_cooldowns(), 1);
        assert_eq!(stats.retries(), 1);
        assert_eq!(stats.downloaded(), 1);
        assert!(ledger.contains(&url));
    }

    #[tokio::test]
    async fn test_rate_limited_twice_abandons_item_and_continues() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/busy.pdf"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&mock_server)
            .await;
        mount_pdf(&mock_server, "/next.pdf").await;

        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("PDFs");
        let mut ledger = Ledger::open(temp_dir.path().join("download.txt")).await.unwrap();

        let busy = format!("{}/busy.pdf", mock_server.uri());
        let next = format!("{}/next.pdf", mock_server.uri());
        let mut pages = HashMap::new();
        pages.insert(0, page_json(&[(&busy, "busy.pdf"), (&next, "next.pdf")]));

        let stats = harvester(pages, &output, 0).run(&mut ledger).await.unwrap();

        assert_eq!(stats.rate_limit_cooldowns(), 1);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.downloaded(), 1);
        assert!(!ledger.contains(&busy));
        assert!(ledger.contains(&next));
    }

    #[tokio::test]
    async fn test_non_rate_limit_failure_is_not_retried() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("PDFs");
        let mut ledger = Ledger::open(temp_dir.path().join("download.txt")).await.unwrap();

        let url = format!("{}/gone.pdf", mock_server.uri());
        let mut pages = HashMap::new();
        pages.insert(0, page_json(&[(&url, "gone.pdf")]));

        let stats = harvester(pages, &output, 0).run(&mut ledger).await.unwrap();

        assert_eq!(stats.retries(), 0);
        assert_eq!(stats.failed(), 1);
    }

    #[tokio::test]
    async fn test_run_fails_when_output_dir_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("PDFs");
        std::fs::write(&output, b"not a dir").unwrap();
        let mut ledger = Ledger::open(temp_dir.path().join("download.txt")).await.unwrap();

        let result = harvester(HashMap::new(), &output, 0).run(&mut ledger).await;
        assert!(matches!(result, Err(HarvestError::OutputDir { .. })));
    }
}
