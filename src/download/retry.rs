//! Retry decisions for failed item fetches.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying download errors and determining retry behavior.
//!
//! # Overview
//!
//! When a fetch fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::RateLimited`] - HTTP 429; retried once after a fixed cooldown
//! - [`FailureType::Transient`] - network trouble or 5xx; left for the next run
//! - [`FailureType::Permanent`] - everything else; left for the next run
//!
//! Only rate limiting earns an in-run retry. Everything else stays out of the
//! ledger and is picked up again by the next full run.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use docharvest_core::download::{
//!     DownloadError, RetryPolicy, RetryDecision, classify_error
//! };
//!
//! let policy = RetryPolicy::new(Duration::from_secs(180));
//! let error = DownloadError::http_status("https://example.com/file.pdf", 429);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(180));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { .. } => unreachable!(),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::DownloadError;
use super::constants::DEFAULT_RATE_LIMIT_COOLDOWN;

/// Attempts allowed for a rate-limited item: the first attempt plus one retry.
pub const RATE_LIMITED_MAX_ATTEMPTS: u32 = 2;

/// Classification of download failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Server rate limiting (HTTP 429).
    RateLimited,

    /// Temporary failure that may succeed on a later run.
    ///
    /// Examples: network timeout, 5xx server errors, connection refused.
    Transient,

    /// Failure that is unlikely to change without upstream changes.
    ///
    /// Examples: 404 Not Found, wrong content type, empty body, local write error.
    Permanent,
}

/// Decision on whether to retry a failed fetch within the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the fetch after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so the retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the fetch in this run.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Fixed-cooldown, single-retry policy for rate-limited fetches.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Pause before retrying a rate-limited item.
    cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_COOLDOWN)
    }
}

impl RetryPolicy {
    /// Creates a policy that retries a rate-limited item once after `cooldown`.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            max_attempts: RATE_LIMITED_MAX_ATTEMPTS,
            cooldown,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the cooldown applied before a rate-limit retry.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Determines whether to retry a failed fetch.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::RateLimited => {}
            FailureType::Transient => {
                return RetryDecision::DoNotRetry {
                    reason: "transient failure - left for the next run".to_string(),
                };
            }
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure - retry would not help".to_string(),
                };
            }
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.cooldown,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a download error into a failure type for retry decisions.
///
/// The status code field is inspected directly; 429 is the only retryable
/// signal.
///
/// | Error | Type |
/// |-------|------|
/// | HTTP 429 | RateLimited |
/// | HTTP 408, 5xx | Transient |
/// | other HTTP statuses | Permanent |
/// | Network, Timeout, Read | Transient |
/// | WrongContentType, EmptyBody, Write, Ledger | Permanent |
#[must_use]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::HttpStatus { status, .. } => classify_http_status(*status),
        DownloadError::Network { .. } | DownloadError::Timeout { .. } | DownloadError::Read { .. } => {
            FailureType::Transient
        }
        DownloadError::WrongContentType { .. }
        | DownloadError::EmptyBody { .. }
        | DownloadError::Write { .. }
        | DownloadError::Ledger { .. } => FailureType::Permanent,
    }
}

#[allow(clippy::match_same_arms)]
fn classify_http_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        408 => FailureType::Transient,
        500..=599 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}
