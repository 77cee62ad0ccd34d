//! Metrics collection for the announcer

use std::sync::atomic::{AtomicU64, Ordering};

use shared_types::Timestamp;

/// Counters kept by one announcer.
#[derive(Debug, Default)]
pub struct AnnouncerMetrics {
    /// Announcement rounds attempted
    pub attempts: AtomicU64,

    /// Rounds the registry accepted
    pub successes: AtomicU64,

    /// Rounds that failed
    pub failures: AtomicU64,

    /// `expire_at` of the latest accepted round (millis, 0 if none)
    pub last_expire_at_ms: AtomicU64,
}

impl AnnouncerMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted round
    pub fn record_success(&self, expire_at: Timestamp) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.last_expire_at_ms
            .fetch_max(expire_at.as_millis(), Ordering::Relaxed);
    }

    /// Record a failed round
    pub fn record_failure(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> AnnouncerStats {
        let last = self.last_expire_at_ms.load(Ordering::Relaxed);
        AnnouncerStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            last_expire_at: (last > 0).then(|| Timestamp::from_millis(last)),
        }
    }
}

/// Snapshot of [`AnnouncerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnouncerStats {
    /// Rounds attempted
    pub attempts: u64,
    /// Rounds accepted
    pub successes: u64,
    /// Rounds failed
    pub failures: u64,
    /// Expiration carried by the latest accepted round
    pub last_expire_at: Option<Timestamp>,
}
