//! core::scheduler
//!
//! Throttling of automatic refreshes.
//!
//! The scheduler only answers "is a refresh due?". It yields while the host
//! is busy and never forces a refresh; a skipped tick is simply retried on
//! the next one.

use chrono::{DateTime, Duration, Utc};

/// Tracks when the last refresh started.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    last_refresh: Option<DateTime<Utc>>,
}

impl RefreshScheduler {
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval: Duration::minutes(i64::from(interval_minutes)),
            last_refresh: None,
        }
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Record that a refresh was issued at `now`.
    pub fn mark_refreshed(&mut self, now: DateTime<Utc>) {
        self.last_refresh = Some(now);
    }

    /// True when the interval has elapsed since the last refresh.
    ///
    /// Never refreshed counts as elapsed.
    pub fn interval_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now >= last + self.interval,
        }
    }

    /// The automatic-refresh gate.
    pub fn is_due(&self, now: DateTime<Utc>, auto_refresh: bool, host_busy: bool) -> bool {
        auto_refresh && !host_busy && self.interval_elapsed(now)
    }
}
