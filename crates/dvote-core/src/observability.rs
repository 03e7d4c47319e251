use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters for the vote engine. Rebuilt from zero on restart;
/// the store remains the source of truth for tallies.
#[derive(Debug, Default)]
pub struct VoteMetrics {
    accepted: AtomicU64,
    replaced: AtomicU64,
    duplicates: AtomicU64,
    not_found: AtomicU64,
    retries: AtomicU64,
    exhausted: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteMetricsSnapshot {
    pub accepted: u64,
    pub replaced: u64,
    pub duplicates: u64,
    pub not_found: u64,
    pub retries: u64,
    pub exhausted: u64,
}

impl VoteMetrics {
    pub fn accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> VoteMetricsSnapshot {
        VoteMetricsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = VoteMetrics::default();
        metrics.accepted();
        metrics.accepted();
        metrics.duplicate();
        metrics.retry();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.accepted, 2);
        assert_eq!(snapshot.duplicates, 1);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.exhausted, 0);
    }
}
