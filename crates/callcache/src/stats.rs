//! Memoized fetch statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local counters for a [`MemoizedFetch`](crate::MemoizedFetch)
///
/// These are not the persisted access counters; they reset with the process.
#[derive(Debug, Default)]
pub struct FetchStats {
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

impl FetchStats {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a call answered from the cache
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a call that went to the wrapped fetch
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a wrapped fetch that returned an error
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Calls answered from the cache
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Calls that went to the wrapped fetch
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Wrapped fetches that failed
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Share of calls answered from the cache; 0.0 before any call
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}
