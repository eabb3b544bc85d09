use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use log::trace;

/// Tracks term store operations for the end-of-pass summary
#[derive(Debug)]
pub struct StoreMetrics {
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    cache_hits: AtomicU64,
    failed_ops: AtomicU64,
    records_written: AtomicU64,
    start_time: Instant,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self {
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            failed_ops: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Count a finished lookup and whether it found a record
    pub fn record_lookup(&self, found: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_ops(&self) {
        self.failed_ops.fetch_add(1, Ordering::Relaxed);
        trace!("Failed operation recorded. Total failures: {}", self.failed_ops.load(Ordering::Relaxed));
    }

    pub fn record_writes(&self, count: u64) {
        self.records_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> StoreMetricsStats {
        StoreMetricsStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failed_operations: self.failed_ops.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMetricsStats {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub cache_hits: u64,
    pub failed_operations: u64,
    pub records_written: u64,
    pub uptime_seconds: u64,
}

impl StoreMetricsStats {
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_and_misses() {
        let metrics = StoreMetrics::new();
        metrics.record_lookup(true);
        metrics.record_lookup(false);
        metrics.record_lookup(true);
        metrics.increment_failed_ops();

        let stats = metrics.get_stats();
        assert_eq!(stats.lookups, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.failed_operations, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
