//! Lock-free counters for the result writer
//!
//! # Design Principles (KISS)
//! - Atomic counters on the hot path (producers and worker never contend)
//! - Simple snapshot mechanism for reporting

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between producers, the worker and the controller
///
/// All operations use Relaxed ordering. Statistics are eventually
/// consistent, which is acceptable for monitoring. Once the worker has
/// terminated and been joined, a snapshot is exact.
#[derive(Debug, Default)]
pub struct WriterCounters {
    /// Values accepted into the queue
    pub submitted: AtomicU64,
    /// Values refused because shutdown was in progress
    pub rejected: AtomicU64,
    /// Values written to the sink (including partial composite deliveries)
    pub written: AtomicU64,
    /// Values the sink failed to persist
    pub failed: AtomicU64,
    /// Values delivered to only some children of a composite sink
    pub partial_failures: AtomicU64,
    /// Non-empty drains performed by the worker
    pub batches: AtomicU64,
}

impl WriterCounters {
    /// Create new zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_partial_failures(&self) {
        self.partial_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_batches(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> WriterStats {
        WriterStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            partial_failures: self.partial_failures.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub submitted: u64,
    pub rejected: u64,
    pub written: u64,
    pub failed: u64,
    pub partial_failures: u64,
    pub batches: u64,
}

impl WriterStats {
    /// Accepted values not yet written or failed
    pub fn outstanding(&self) -> u64 {
        self.submitted
            .saturating_sub(self.written)
            .saturating_sub(self.failed)
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Submitted: {}, Written: {}, Failed: {}, Partial: {}, Rejected: {}, Batches: {}",
            self.submitted,
            self.written,
            self.failed,
            self.partial_failures,
            self.rejected,
            self.batches
        )
    }
}
