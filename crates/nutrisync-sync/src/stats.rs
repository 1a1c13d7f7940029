//! Counters for remote and cache writes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for persistence activity.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Remote upserts sent
    pub upserts_attempted: AtomicU64,
    /// Remote upserts acknowledged
    pub upserts_succeeded: AtomicU64,
    /// Remote upserts that failed
    pub upserts_failed: AtomicU64,
    /// Remote upserts skipped while local-only or degraded
    pub upserts_skipped: AtomicU64,
    /// Snapshots written to the local cache
    pub cache_writes: AtomicU64,
    /// Snapshot writes that failed
    pub cache_failures: AtomicU64,
}

/// Plain copy of [`SyncStats`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub upserts_attempted: u64,
    pub upserts_succeeded: u64,
    pub upserts_failed: u64,
    pub upserts_skipped: u64,
    pub cache_writes: u64,
    pub cache_failures: u64,
}

impl SyncStatsSnapshot {
    /// Share of attempted upserts that succeeded (0.0 - 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.upserts_attempted == 0 {
            0.0
        } else {
            self.upserts_succeeded as f64 / self.upserts_attempted as f64
        }
    }
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_upsert(&self, ok: bool) {
        self.upserts_attempted.fetch_add(1, Ordering::Relaxed);
        if ok {
            self.upserts_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.upserts_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_skipped(&self, count: u64) {
        self.upserts_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_cache_write(&self, ok: bool) {
        if ok {
            self.cache_writes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            upserts_attempted: self.upserts_attempted.load(Ordering::Relaxed),
            upserts_succeeded: self.upserts_succeeded.load(Ordering::Relaxed),
            upserts_failed: self.upserts_failed.load(Ordering::Relaxed),
            upserts_skipped: self.upserts_skipped.load(Ordering::Relaxed),
            cache_writes: self.cache_writes.load(Ordering::Relaxed),
            cache_failures: self.cache_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_counters() {
        let stats = SyncStats::new();
        stats.record_upsert(true);
        stats.record_upsert(true);
        stats.record_upsert(true);
        stats.record_upsert(false);

        let snap = stats.snapshot();
        assert_eq!(snap.upserts_attempted, 4);
        assert_eq!(snap.upserts_failed, 1);
        assert!((snap.success_rate() - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_empty_success_rate() {
        assert_eq!(SyncStats::new().snapshot().success_rate(), 0.0);
    }

    #[test]
    fn test_cache_counters() {
        let stats = SyncStats::new();
        stats.record_cache_write(true);
        stats.record_cache_write(false);
        stats.record_skipped(3);

        let snap = stats.snapshot();
        assert_eq!(snap.cache_writes, 1);
        assert_eq!(snap.cache_failures, 1);
        assert_eq!(snap.upserts_skipped, 3);
    }
}
