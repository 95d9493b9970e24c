//! Constants for the download module (timeouts, rate-limit cooldown).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (1 minute).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default pause after an HTTP 429 before the single retry (3 minutes).
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(180);

/// Suffix of the temporary file a body is streamed into before rename.
pub const PARTIAL_SUFFIX: &str = ".part";
