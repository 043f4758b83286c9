//! Common data types shared across components
//!
//! This module defines the value type that flows from producers through the
//! queue into sinks, plus the error, metrics, shutdown and CLI plumbing
//! shared by the library and the binary.

pub mod cli;
pub mod error;
pub mod metrics;
pub mod shutdown;

pub use error::{LifecycleError, LifecycleResult, SinkError, SinkResult};
pub use metrics::{WriterCounters, WriterStats};

use std::fmt;

/// A result waiting in the queue to be written
///
/// `seq` is the FIFO position assigned under the queue lock at enqueue time.
/// Sequence numbers are strictly increasing per queue, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingResult {
    /// FIFO position within the queue that accepted the value
    pub seq: u64,
    /// The integer result to persist
    pub value: i64,
}

impl PendingResult {
    /// Create a new pending result
    pub fn new(seq: u64, value: i64) -> Self {
        Self { seq, value }
    }
}

impl fmt::Display for PendingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}={}", self.seq, self.value)
    }
}
