//! Self-re-arming long-poll loop feeding a [`FeedSink`].

use std::sync::Arc;
use std::time::Duration;

use jobwatch_core::{ProgressFeed, ProgressStore};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};
use tokio_util::sync::CancellationToken;

use crate::{FetchError, ProgressTransport, SyncSettings};

/// Receiver of every successfully fetched feed.
pub trait FeedSink: Send + Sync {
    fn apply(&self, feed: ProgressFeed);
}

impl FeedSink for ProgressStore {
    fn apply(&self, feed: ProgressFeed) {
        ProgressStore::apply(self, feed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub long_poll_timeout_secs: u64,
    pub poll_retry_delay: Duration,
    pub resync_retry_delay: Duration,
}

impl From<&SyncSettings> for PollSettings {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            long_poll_timeout_secs: settings.long_poll_timeout_secs,
            poll_retry_delay: settings.poll_retry_delay,
            resync_retry_delay: settings.resync_retry_delay,
        }
    }
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStats {
    pub delivered: u64,
    pub timeouts: u64,
    pub failures: u64,
}

pub struct ProgressPoller<T> {
    transport: T,
    sink: Arc<dyn FeedSink>,
    settings: PollSettings,
    cancel: CancellationToken,
    stats: PollStats,
}

impl<T: ProgressTransport> ProgressPoller<T> {
    pub fn new(
        transport: T,
        sink: Arc<dyn FeedSink>,
        settings: PollSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            sink,
            settings,
            cancel,
            stats: PollStats::default(),
        }
    }

    /// Runs until the token is cancelled.
    ///
    /// A non-waiting fetch always comes first so the initial paint never waits
    /// for a long-poll. Afterwards: a timeout triggers an immediate
    /// non-waiting resync, a failed resync waits `resync_retry_delay`, and a
    /// failed long-poll waits `poll_retry_delay`.
    pub async fn run(mut self) -> PollStats {
        loop {
            match self.request(false).await {
                None => return self.stats,
                Some(Ok(feed)) => {
                    self.deliver(feed);
                    break;
                }
                Some(Err(err)) => {
                    self.stats.failures += 1;
                    watch_warn!("Initial progress fetch failed: {err}");
                    if !self.pause(self.settings.poll_retry_delay).await {
                        return self.stats;
                    }
                }
            }
        }

        loop {
            match self.request(true).await {
                None => return self.stats,
                Some(Ok(feed)) => self.deliver(feed),
                Some(Err(err)) if err.is_timeout() => {
                    self.stats.timeouts += 1;
                    watch_debug!("Long-poll timed out; resyncing");
                    match self.request(false).await {
                        None => return self.stats,
                        Some(Ok(feed)) => self.deliver(feed),
                        Some(Err(err)) => {
                            self.stats.failures += 1;
                            watch_warn!("Progress resync failed: {err}");
                            if !self.pause(self.settings.resync_retry_delay).await {
                                return self.stats;
                            }
                        }
                    }
                }
                Some(Err(err)) => {
                    self.stats.failures += 1;
                    watch_warn!("Progress long-poll failed: {err}");
                    if !self.pause(self.settings.poll_retry_delay).await {
                        return self.stats;
                    }
                }
            }
        }
    }

    /// `None` once cancelled, including when the response raced cancellation.
    async fn request(&mut self, wait: bool) -> Option<Result<ProgressFeed, FetchError>> {
        let timeout_secs = self.settings.long_poll_timeout_secs;
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            result = self.transport.poll(None, wait, timeout_secs) => result,
        };
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(result)
    }

    fn deliver(&mut self, feed: ProgressFeed) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.stats.delivered += 1;
        self.sink.apply(feed);
    }

    /// Sleeps for `delay`; returns `false` if cancelled meanwhile.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                watch_info!("Progress poller cancelled during backoff");
                false
            }
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
