//! Per-router counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Router counters
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Messages taken from the source
    pub received: AtomicU64,

    /// Packets pushed onto the output queue
    pub published: AtomicU64,

    /// Messages dropped: payload did not decode
    pub dropped_decode: AtomicU64,

    /// Messages dropped: a field value was unusable
    pub dropped_extract: AtomicU64,

    /// Messages dropped: no position
    pub dropped_position: AtomicU64,

    /// Messages dropped: packet could not be encoded
    pub dropped_encode: AtomicU64,
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped message by metric reason label
    pub fn record_dropped(&self, reason: &str) {
        let counter = match reason {
            "decode" => &self.dropped_decode,
            "extract" => &self.dropped_extract,
            "position" => &self.dropped_position,
            _ => &self.dropped_encode,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> RouterCounters {
        RouterCounters {
            received: self.received.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            dropped_decode: self.dropped_decode.load(Ordering::Relaxed),
            dropped_extract: self.dropped_extract.load(Ordering::Relaxed),
            dropped_position: self.dropped_position.load(Ordering::Relaxed),
            dropped_encode: self.dropped_encode.load(Ordering::Relaxed),
        }
    }
}

/// Counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterCounters {
    pub received: u64,
    pub published: u64,
    pub dropped_decode: u64,
    pub dropped_extract: u64,
    pub dropped_position: u64,
    pub dropped_encode: u64,
}

impl RouterCounters {
    /// Total dropped messages
    pub fn dropped(&self) -> u64 {
        self.dropped_decode + self.dropped_extract + self.dropped_position + self.dropped_encode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_by_reason() {
        let metrics = RouterMetrics::new();
        metrics.record_received();
        metrics.record_received();
        metrics.record_dropped("decode");
        metrics.record_dropped("position");
        metrics.record_published();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.received, 2);
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.dropped_decode, 1);
        assert_eq!(snapshot.dropped_position, 1);
        assert_eq!(snapshot.dropped(), 2);
    }
}
