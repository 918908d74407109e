use std::time::Duration;

use jobwatch_core::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Root of the backend API, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Timeout for every request that is not a long-poll.
    pub request_timeout: Duration,
    /// How long the server may hold a waiting `/progress` request.
    pub long_poll_timeout_secs: u64,
    /// Added to the server hold time for the client-side deadline.
    pub timeout_margin: Duration,
    /// Delay after a failed primary poll.
    pub poll_retry_delay: Duration,
    /// Delay after a failed resync following a timeout.
    pub resync_retry_delay: Duration,
    pub archive_page_size: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            long_poll_timeout_secs: 30,
            timeout_margin: Duration::from_secs(5),
            poll_retry_delay: Duration::from_secs(5),
            resync_retry_delay: Duration::from_secs(1),
            archive_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SyncSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
