//! Error types for the result writer
//!
//! # Design Principles (KISS)
//! - `SinkError` covers write-time failures; the worker handles them locally
//! - `LifecycleError` covers the only errors surfaced to callers
//! - Use thiserror for ergonomic error handling

use std::time::Duration;

use thiserror::Error;

/// Write-time errors produced by a sink
///
/// These never escape the worker thread. The worker logs them, counts them
/// and hands them to the optional error hook, then keeps draining.
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O error while persisting one value
    #[error("Sink '{sink}' failed to write {value}: {source}")]
    Write {
        sink: String,
        value: i64,
        #[source]
        source: std::io::Error,
    },

    /// Sink refused a value without an underlying I/O error
    #[error("Sink '{sink}' rejected {value}: {reason}")]
    Rejected {
        sink: String,
        value: i64,
        reason: String,
    },

    /// Some (not all) children of a composite sink failed
    #[error(
        "Composite sink delivered {value} to {delivered} of {total} children: {}",
        join_failures(.failures)
    )]
    PartialFailure {
        value: i64,
        delivered: usize,
        total: usize,
        failures: Vec<SinkError>,
    },

    /// Every child of a composite sink failed
    #[error("All {} children of composite sink failed for {value}: {}", .failures.len(), join_failures(.failures))]
    AllFailed {
        value: i64,
        failures: Vec<SinkError>,
    },

    /// Releasing one or more child sinks failed
    #[error("Failed to close {} sink(s): {}", .failures.len(), join_failures(.failures))]
    CloseFailed { failures: Vec<SinkError> },
}

fn join_failures(failures: &[SinkError]) -> String {
    failures
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SinkError {
    /// Create a write error from an I/O error
    pub fn write(sink: impl Into<String>, value: i64, source: std::io::Error) -> Self {
        Self::Write {
            sink: sink.into(),
            value,
            source,
        }
    }

    /// Create a rejection error
    pub fn rejected(sink: impl Into<String>, value: i64, reason: impl Into<String>) -> Self {
        Self::Rejected {
            sink: sink.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Whether the value still reached at least one destination
    ///
    /// Only a composite partial failure counts as delivered.
    pub fn delivered(&self) -> bool {
        matches!(self, Self::PartialFailure { .. })
    }
}

/// Result type alias using SinkError
pub type SinkResult<T> = Result<T, SinkError>;

/// Lifecycle errors returned synchronously to callers
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Submission arrived after shutdown was initiated; the value is discarded
    #[error("Submission of {value} rejected: shutdown in progress")]
    SubmitAfterShutdown { value: i64 },

    /// Worker did not terminate within the caller's wait
    #[error("Worker did not terminate within {timeout:?} ({pending} results still queued)")]
    ShutdownTimeout { timeout: Duration, pending: usize },

    /// `start` was called twice, or after shutdown
    #[error("Writer already started or shut down")]
    AlreadyStarted,

    /// Operation requires a started writer
    #[error("Writer not started")]
    NotStarted,

    /// The worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Values were accepted but no worker is running to write them
    #[error("{pending} accepted results have no running worker to write them")]
    Undelivered { pending: usize },

    /// The worker thread panicked (a sink implementation panicked)
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// Releasing the sink after termination failed
    #[error("Failed to close sink: {0}")]
    SinkClose(#[source] SinkError),
}

impl LifecycleError {
    /// Whether this is the reject-after-shutdown error
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::SubmitAfterShutdown { .. })
    }

    /// Whether this is a shutdown timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ShutdownTimeout { .. })
    }
}

/// Result type alias using LifecycleError
pub type LifecycleResult<T> = Result<T, LifecycleError>;
