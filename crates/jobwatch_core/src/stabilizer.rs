//! Minimum-visible-time gate between the latest feed and what is rendered.

use std::time::{Duration, Instant};

pub const DEFAULT_MIN_DISPLAY_TIME: Duration = Duration::from_millis(1500);

/// Values whose blank form does not start the display timer.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for crate::ProgressFeed {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Holds each displayed value for at least `min_display` before replacing it.
///
/// Callers supply the clock: `push` with every new value, `poll` on every
/// tick. Only the newest pending value is ever shown when the deadline passes.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayStabilizer<T> {
    min_display: Duration,
    displayed: Option<T>,
    shown_at: Option<Instant>,
    pending: Option<(T, Instant)>,
    cancelled: bool,
}

impl<T: Blank> DisplayStabilizer<T> {
    pub fn new(min_display: Duration) -> Self {
        Self {
            min_display,
            displayed: None,
            shown_at: None,
            pending: None,
            cancelled: false,
        }
    }

    /// Offers a new value. Returns `true` when the displayed value changed now.
    pub fn push(&mut self, value: T, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        let Some(shown_at) = self.shown_at else {
            // Nothing substantive shown yet: no delay on the initial paint.
            if !value.is_blank() {
                self.shown_at = Some(now);
            }
            self.pending = None;
            self.displayed = Some(value);
            return true;
        };

        let elapsed = now.saturating_duration_since(shown_at);
        if elapsed >= self.min_display {
            self.pending = None;
            self.show(value, now);
            true
        } else {
            self.pending = Some((value, shown_at + self.min_display));
            false
        }
    }

    /// Applies the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        match self.pending.take() {
            Some((value, due)) if now >= due => {
                self.show(value, now);
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Drops any deferred value; later pushes and polls are ignored.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.pending = None;
    }

    pub fn displayed(&self) -> Option<&T> {
        self.displayed.as_ref()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn min_display(&self) -> Duration {
        self.min_display
    }

    fn show(&mut self, value: T, now: Instant) {
        self.displayed = Some(value);
        self.shown_at = Some(now);
    }
}
