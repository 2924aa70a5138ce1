//! Scan statistics with atomic counters.
//!
//! This module provides [`ScanStats`] for counting what a scan visited and
//! [`StatsSnapshot`] for a point-in-time copy of those counts.
//!
//! All counters use [`AtomicU64`] with relaxed ordering. The numbers are
//! informational and never drive scanning decisions.
//!
//! # Examples
//!
//! ```
//! use dl_scanner::ScanStats;
//!
//! let stats = ScanStats::new();
//! stats.increment_directories();
//! stats.increment_matched();
//! stats.increment_loaded();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.matched, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for one scanner.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Directories listed.
    directories: AtomicU64,
    /// Files whose name and path passed the filters.
    matched: AtomicU64,
    /// Files handed to the loader successfully.
    loaded: AtomicU64,
    /// Files whose load failed and was tolerated.
    load_failures: AtomicU64,
    /// Entries skipped by an exclusion rule.
    excluded: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the listed directories counter.
    #[inline]
    pub fn increment_directories(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the matched files counter.
    #[inline]
    pub fn increment_matched(&self) {
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the loaded files counter.
    #[inline]
    pub fn increment_loaded(&self) {
        self.loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the tolerated load failures counter.
    #[inline]
    pub fn increment_load_failures(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the excluded entries counter.
    #[inline]
    pub fn increment_excluded(&self) {
        self.excluded.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            directories: self.directories.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            loaded: self.loaded.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.directories.store(0, Ordering::Relaxed);
        self.matched.store(0, Ordering::Relaxed);
        self.loaded.store(0, Ordering::Relaxed);
        self.load_failures.store(0, Ordering::Relaxed);
        self.excluded.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`ScanStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Directories listed.
    pub directories: u64,
    /// Files that passed the filters.
    pub matched: u64,
    /// Files loaded successfully.
    pub loaded: u64,
    /// Load failures that were tolerated.
    pub load_failures: u64,
    /// Entries skipped by an exclusion rule.
    pub excluded: u64,
}

impl StatsSnapshot {
    /// Returns matched files that were not loaded (skipped or failed).
    #[inline]
    #[must_use]
    pub const fn unloaded(&self) -> u64 {
        self.matched.saturating_sub(self.loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        assert_eq!(ScanStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_increments() {
        let stats = ScanStats::new();
        stats.increment_directories();
        stats.increment_directories();
        stats.increment_matched();
        stats.increment_matched();
        stats.increment_loaded();
        stats.increment_load_failures();
        stats.increment_excluded();

        let snap = stats.snapshot();
        assert_eq!(snap.directories, 2);
        assert_eq!(snap.matched, 2);
        assert_eq!(snap.loaded, 1);
        assert_eq!(snap.load_failures, 1);
        assert_eq!(snap.excluded, 1);
        assert_eq!(snap.unloaded(), 1);
    }

    #[test]
    fn test_reset() {
        let stats = ScanStats::new();
        stats.increment_matched();
        stats.reset();
        assert_eq!(stats.snapshot().matched, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = StatsSnapshot {
            directories: 3,
            matched: 2,
            loaded: 2,
            load_failures: 0,
            excluded: 1,
        };
        insta::assert_json_snapshot!(snap, @r#"
        {
          "directories": 3,
          "matched": 2,
          "loaded": 2,
          "load_failures": 0,
          "excluded": 1
        }
        "#);
    }
}
