//! LAPSE - Table Metrics
//! Atomic counters tracking insert, refresh, removal and expiration
//! activity of an expiring table.
//!
//! Tables are mutated by a single writer, but the counters are atomics so a
//! reporting thread can read them through a shared reference at any time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Operation counters for an expiring table.
///
/// All counters use `Ordering::Relaxed`; they are observability only.
#[derive(Debug)]
pub struct TableMetrics {
    /// Entries inserted.
    pub inserts: AtomicU64,
    /// Refresh (touch) calls that moved an entry to the newest end.
    pub refreshes: AtomicU64,
    /// Explicit removals.
    pub removals: AtomicU64,
    /// Entries dropped by expiration.
    pub expired: AtomicU64,
    /// Expiration passes run, including passes that removed nothing.
    pub expiration_passes: AtomicU64,
    /// Inserts refused because every index was in use.
    pub rejected_inserts: AtomicU64,
    /// When the table was opened.
    opened: Instant,
}

/// Point-in-time copy of [`TableMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub refreshes: u64,
    pub removals: u64,
    pub expired: u64,
    pub expiration_passes: u64,
    pub rejected_inserts: u64,
}

impl TableMetrics {
    pub fn new() -> Self {
        Self {
            inserts: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            removals: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            expiration_passes: AtomicU64::new(0),
            rejected_inserts: AtomicU64::new(0),
            opened: Instant::now(),
        }
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_insert(&self) {
        self.rejected_inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one expiration pass that removed `count` entries.
    pub fn record_expiration(&self, count: usize) {
        self.expiration_passes.fetch_add(1, Ordering::Relaxed);
        self.expired.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> f64 {
        self.opened.elapsed().as_secs_f64()
    }

    /// Inserts + refreshes + removals + expired entries.
    pub fn total_ops(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
            + self.refreshes.load(Ordering::Relaxed)
            + self.removals.load(Ordering::Relaxed)
            + self.expired.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            expiration_passes: self.expiration_passes.load(Ordering::Relaxed),
            rejected_inserts: self.rejected_inserts.load(Ordering::Relaxed),
        }
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        let s = self.snapshot();
        format!(
            "\n═══ LAPSE Table Metrics ═══\n\
             Entries:\n\
               inserts:    {}\n\
               refreshes:  {}\n\
               removals:   {}\n\
               rejected:   {}\n\
             Expiration:\n\
               passes:     {}\n\
               expired:    {}\n\
             Uptime: {:.2}s",
            s.inserts,
            s.refreshes,
            s.removals,
            s.rejected_inserts,
            s.expiration_passes,
            s.expired,
            self.uptime_secs(),
        )
    }
}

impl Default for TableMetrics {
    fn default() -> Self {
        Self::new()
    }
}
