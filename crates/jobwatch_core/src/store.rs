//! Last known progress feed with ordered fan-out to subscribers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use jobwatch_logging::{watch_debug, watch_error, watch_warn};

use crate::{JobStatus, ProgressFeed};

type Callback = Box<dyn FnMut(&ProgressFeed, &ProgressFeed) + Send>;
type SharedCallback = Arc<Mutex<Callback>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, SharedCallback)>,
}

impl Registry {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }
}

#[derive(Debug, Default)]
struct Feeds {
    current: Option<ProgressFeed>,
    previous: Option<ProgressFeed>,
}

/// Owns the latest [`ProgressFeed`] and notifies subscribers on every change.
///
/// The first applied feed only ends the loading phase; every later feed is
/// delivered as `(current, previous)` to each subscriber in registration
/// order. A panicking subscriber is logged and skipped without affecting the
/// others.
pub struct ProgressStore {
    feeds: Mutex<Feeds>,
    registry: Arc<Mutex<Registry>>,
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore {
    pub fn new() -> Self {
        Self {
            feeds: Mutex::new(Feeds::default()),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// `true` until the first feed has been applied.
    pub fn is_loading(&self) -> bool {
        lock(&self.feeds).current.is_none()
    }

    pub fn current(&self) -> Option<ProgressFeed> {
        lock(&self.feeds).current.clone()
    }

    pub fn previous(&self) -> Option<ProgressFeed> {
        lock(&self.feeds).previous.clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&ProgressFeed, &ProgressFeed) + Send + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .entries
            .push((id, Arc::new(Mutex::new(Box::new(callback)))));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    /// Replaces the current feed and returns how many subscribers received it.
    pub fn apply(&self, feed: ProgressFeed) -> usize {
        let (current, previous) = {
            let mut feeds = lock(&self.feeds);
            let Some(previous) = feeds.current.replace(feed.clone()) else {
                watch_debug!("Initial progress feed with {} jobs", feed.len());
                return 0;
            };
            warn_on_regression(&feed, &previous);
            feeds.previous = Some(previous.clone());
            (feed, previous)
        };

        // Snapshot so callbacks may subscribe or unsubscribe while we deliver.
        let round: Vec<(u64, SharedCallback)> = lock(&self.registry).entries.clone();
        let mut delivered = 0;
        for (id, callback) in round {
            if !lock(&self.registry).contains(id) {
                continue;
            }
            let mut callback = lock(&callback);
            let outcome = catch_unwind(AssertUnwindSafe(|| (*callback)(&current, &previous)));
            match outcome {
                Ok(()) => delivered += 1,
                Err(_) => watch_error!("Progress subscriber {id} panicked; continuing delivery"),
            }
        }
        delivered
    }
}

/// Handle returned by [`ProgressStore::subscribe`].
///
/// Delivery continues until [`Subscription::unsubscribe`] is called; dropping
/// the handle does not unsubscribe.
#[must_use = "keep the handle to be able to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|(id, _)| *id != self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| lock(&registry).contains(self.id))
    }
}

fn warn_on_regression(current: &ProgressFeed, previous: &ProgressFeed) {
    for (job_id, job) in current.iter() {
        let Some(before) = previous.get(job_id) else {
            continue;
        };
        if before.status.is_terminal() && job.status == JobStatus::Running {
            watch_warn!(
                "Job {job_id} went from {} back to running; treating it as a new run",
                before.status
            );
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
