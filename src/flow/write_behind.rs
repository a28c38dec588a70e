//! Bounded-latency write-behind for draft saves

use std::time::{Duration, Instant};

/// Tracks unsaved changes and when they must be flushed
#[derive(Debug, Clone)]
pub struct WriteBehind {
    latency: Duration,
    dirty_since: Option<Instant>,
}

impl WriteBehind {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            dirty_since: None,
        }
    }

    /// Record a change at `now`. The oldest unsaved change sets the deadline.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since.get_or_insert(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// True once the oldest unsaved change has waited `latency`
    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.latency)
    }

    pub fn clear(&mut self) {
        self.dirty_since = None;
    }
}
