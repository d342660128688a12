// file: src/pipeline/progress.rs
// description: run counters shared by discovery and workers
// reference: atomic counters snapshotted into a summary at the end of a run

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scopes_failed: usize,
    pub repositories_discovered: usize,
    pub repositories_processed: usize,
    pub repositories_failed: usize,
    pub files_synced: usize,
    pub files_failed: usize,
    pub duration_secs: u64,
}

impl RunSummary {
    pub fn success_rate(&self) -> f64 {
        let total = self.repositories_processed + self.repositories_failed;
        if total == 0 {
            return 0.0;
        }
        (self.repositories_processed as f64 / total as f64) * 100.0
    }

    pub fn repositories_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.repositories_processed as f64 / self.duration_secs as f64
    }
}

#[derive(Debug)]
pub struct RunStats {
    scopes_failed: AtomicUsize,
    repositories_discovered: AtomicUsize,
    repositories_processed: AtomicUsize,
    repositories_failed: AtomicUsize,
    files_synced: AtomicUsize,
    files_failed: AtomicUsize,
    start_time: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            scopes_failed: AtomicUsize::new(0),
            repositories_discovered: AtomicUsize::new(0),
            repositories_processed: AtomicUsize::new(0),
            repositories_failed: AtomicUsize::new(0),
            files_synced: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_scopes_failed(&self) {
        self.scopes_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_repositories_discovered(&self) {
        self.repositories_discovered.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_repositories_processed(&self) {
        self.repositories_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_repositories_failed(&self) {
        self.repositories_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_files_synced(&self) {
        self.files_synced.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_files_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get_summary(&self) -> RunSummary {
        RunSummary {
            scopes_failed: self.scopes_failed.load(Ordering::SeqCst),
            repositories_discovered: self.repositories_discovered.load(Ordering::SeqCst),
            repositories_processed: self.repositories_processed.load(Ordering::SeqCst),
            repositories_failed: self.repositories_failed.load(Ordering::SeqCst),
            files_synced: self.files_synced.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_calculations() {
        let summary = RunSummary {
            repositories_processed: 90,
            repositories_failed: 10,
            duration_secs: 10,
            ..Default::default()
        };

        assert_eq!(summary.repositories_per_second(), 9.0);
        assert!((summary.success_rate() - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_summary_zero_duration() {
        let summary = RunSummary::default();
        assert_eq!(summary.repositories_per_second(), 0.0);
        assert_eq!(summary.success_rate(), 0.0);
    }

    #[test]
    fn test_counters() {
        let stats = RunStats::new();
        stats.inc_repositories_discovered();
        stats.inc_repositories_discovered();
        stats.inc_repositories_processed();
        stats.inc_files_synced();
        stats.inc_files_failed();
        stats.inc_scopes_failed();

        let summary = stats.get_summary();
        assert_eq!(summary.repositories_discovered, 2);
        assert_eq!(summary.repositories_processed, 1);
        assert_eq!(summary.repositories_failed, 0);
        assert_eq!(summary.files_synced, 1);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.scopes_failed, 1);
    }
}
