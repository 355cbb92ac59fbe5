//! Configuration structure consumed by the handler lifecycle.
//!
//! [`HttpHandlerBuilder`](crate::builder::HttpHandlerBuilder) assembles these
//! values before passing them to [`HttpHandler`](crate::handler::HttpHandler)
//! for runtime use.

use std::time::Duration;

pub use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

/// Default collector base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Default collector endpoint path.
pub const DEFAULT_LOG_ENDPOINT: &str = "/api/logs/";
/// Default bounded channel capacity used by the handler.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
/// Default connection timeout applied when establishing HTTP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default request timeout applied to HTTP requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of delivery attempts per event.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default pause between delivery attempts for the same event.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Configuration object describing how to construct an
/// [`HttpHandler`](crate::handler::HttpHandler).
///
/// `base_url` may carry a trailing slash; it is stripped during handler
/// construction so the delivery target is always
/// `{base_url}{log_endpoint}` without a doubled separator. `log_endpoint`
/// must start with a slash.
#[derive(Clone, Debug)]
pub struct HttpHandlerConfig {
    /// Collector base URL, scheme and authority included.
    pub base_url: String,
    /// Collector endpoint path, leading slash included.
    pub log_endpoint: String,
    /// Optional project label attached to every delivered event.
    pub project_name: Option<String>,
    /// Optional instance identifier attached to every delivered event.
    pub identifier: Option<String>,
    /// Optional display name replacing the originating logger's name in the
    /// delivered payload. When `None`, the logger's own name is emitted.
    pub display_name: Option<String>,
    /// Bounded channel capacity for the producer-consumer queue.
    pub capacity: usize,
    /// Timeout for establishing connections.
    pub connect_timeout: Duration,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Total delivery attempts per event, including the first.
    pub max_attempts: usize,
    /// Pause between delivery attempts for the same event.
    pub retry_delay: Duration,
    /// Interval between rate-limited drop warnings.
    pub warn_interval: Duration,
}

impl HttpHandlerConfig {
    /// Full delivery target, the concatenation of base URL and endpoint.
    ///
    /// Meaningful once the base URL has been normalized (trailing slashes
    /// stripped), which handler construction guarantees.
    pub fn target_url(&self) -> String {
        format!("{}{}", self.base_url, self.log_endpoint)
    }
}

impl Default for HttpHandlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            log_endpoint: DEFAULT_LOG_ENDPOINT.to_owned(),
            project_name: None,
            identifier: None,
            display_name: None,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}
