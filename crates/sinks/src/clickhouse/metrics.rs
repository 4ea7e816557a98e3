//! ClickHouse hook metrics
//!
//! Atomic counters for tracking delivery outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Metrics
// =============================================================================

/// Metrics for the ClickHouse hook
#[derive(Debug, Default)]
pub struct HookMetrics {
    /// Entries accepted by `deliver`
    pub rows_delivered: AtomicU64,

    /// Rows the store acknowledged
    pub rows_inserted: AtomicU64,

    /// Inserts that returned an error (including cancellation and timeouts)
    pub insert_errors: AtomicU64,

    /// Insert units that panicked or were aborted
    pub insert_faults: AtomicU64,
}

impl HookMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            rows_delivered: AtomicU64::new(0),
            rows_inserted: AtomicU64::new(0),
            insert_errors: AtomicU64::new(0),
            insert_faults: AtomicU64::new(0),
        }
    }

    /// Record an accepted entry
    #[inline]
    pub fn record_delivered(&self) {
        self.rows_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful insert
    #[inline]
    pub fn record_inserted(&self) {
        self.rows_inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed insert
    #[inline]
    pub fn record_error(&self) {
        self.insert_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a panicked or aborted insert unit
    #[inline]
    pub fn record_fault(&self) {
        self.insert_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_delivered: self.rows_delivered.load(Ordering::Relaxed),
            rows_inserted: self.rows_inserted.load(Ordering::Relaxed),
            insert_errors: self.insert_errors.load(Ordering::Relaxed),
            insert_faults: self.insert_faults.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`HookMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_delivered: u64,
    pub rows_inserted: u64,
    pub insert_errors: u64,
    pub insert_faults: u64,
}

impl MetricsSnapshot {
    /// Rows whose insert unit has not finished yet
    pub fn in_flight(&self) -> u64 {
        self.rows_delivered
            .saturating_sub(self.rows_inserted + self.insert_errors + self.insert_faults)
    }

    /// Rows lost to failed or faulted inserts
    pub fn rows_lost(&self) -> u64 {
        self.insert_errors + self.insert_faults
    }
}
