//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of a single dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Packets handed to the sender successfully
    sent: AtomicU64,
    /// Packets the sender failed to transmit
    failed: AtomicU64,
    /// Packets still queued when the dispatcher stopped
    discarded: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn add_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> DispatcherCounters {
        DispatcherCounters {
            sent: self.sent(),
            failed: self.failed(),
            discarded: self.discarded(),
        }
    }
}

/// Snapshot of dispatcher counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherCounters {
    pub sent: u64,
    pub failed: u64,
    pub discarded: u64,
}

impl DispatcherCounters {
    /// Packets taken off the queue or discarded
    pub fn total(&self) -> u64 {
        self.sent + self.failed + self.discarded
    }
}
