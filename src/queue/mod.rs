//! Result queue with wake signal and shutdown latch
//!
//! Architecture:
//! - One `parking_lot::Mutex` guards the pending values, the wake flag and
//!   the shutdown flag; one `Condvar` wakes the worker for either
//! - `ResultQueue` is the producer/consumer face, `ShutdownLatch` the
//!   controller face, both share the same lock/condition pair
//!
//! Enqueue checks the latch under the same lock it appends under, so every
//! value is either queued before the latch is set or rejected. After the
//! latch is set the queue can only shrink.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::common::{LifecycleError, LifecycleResult, PendingResult};

/// Why the worker's wait returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// New work was enqueued
    Work,
    /// Shutdown latch is set and no wake was pending
    Shutdown,
    /// Both a wake and the latch were observed
    WorkAndShutdown,
}

impl fmt::Display for WakeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeReason::Work => write!(f, "Work"),
            WakeReason::Shutdown => write!(f, "Shutdown"),
            WakeReason::WorkAndShutdown => write!(f, "WorkAndShutdown"),
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<PendingResult>,
    next_seq: u64,
    /// Edge-triggered: raised by enqueue, consumed by `wait_for_work`
    wake_raised: bool,
    /// Write-once
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    signal: Condvar,
}

/// Thread-safe FIFO of pending results
///
/// Any number of producers may call [`enqueue`](Self::enqueue); exactly one
/// worker calls [`wait_for_work`](Self::wait_for_work) and
/// [`drain_all`](Self::drain_all).
#[derive(Debug, Clone, Default)]
pub struct ResultQueue {
    shared: Arc<Shared>,
}

impl ResultQueue {
    /// Create an empty queue with an unset latch
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch bound to this queue
    pub fn latch(&self) -> ShutdownLatch {
        ShutdownLatch {
            shared: self.shared.clone(),
        }
    }

    /// Append a value and raise the wake signal
    ///
    /// Fails with [`LifecycleError::SubmitAfterShutdown`] once the latch is set.
    pub fn enqueue(&self, value: i64) -> LifecycleResult<PendingResult> {
        let pending = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return Err(LifecycleError::SubmitAfterShutdown { value });
            }
            let pending = PendingResult::new(state.next_seq, value);
            state.next_seq += 1;
            state.pending.push_back(pending);
            state.wake_raised = true;
            pending
        };
        self.shared.signal.notify_one();
        Ok(pending)
    }

    /// Atomically remove and return everything queued, in FIFO order
    pub fn drain_all(&self) -> Vec<PendingResult> {
        let mut state = self.shared.state.lock();
        state.pending.drain(..).collect()
    }

    /// Block until a wake is raised or the latch is set
    ///
    /// Consumes the wake. Returns immediately while the latch is set.
    pub fn wait_for_work(&self) -> WakeReason {
        let mut state = self.shared.state.lock();
        while !state.wake_raised && !state.shutdown {
            self.shared.signal.wait(&mut state);
        }
        let work = std::mem::take(&mut state.wake_raised);
        match (work, state.shutdown) {
            (true, true) => WakeReason::WorkAndShutdown,
            (true, false) => WakeReason::Work,
            _ => WakeReason::Shutdown,
        }
    }

    /// Latch set and nothing left to write, observed atomically
    pub fn is_finished(&self) -> bool {
        let state = self.shared.state.lock();
        state.shutdown && state.pending.is_empty()
    }

    /// Number of values waiting to be drained
    pub fn len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-shot, idempotent shutdown request
#[derive(Debug, Clone)]
pub struct ShutdownLatch {
    shared: Arc<Shared>,
}

impl ShutdownLatch {
    /// Set the latch and wake the worker
    ///
    /// Returns `true` only for the call that actually set it.
    pub fn signal(&self) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return false;
            }
            state.shutdown = true;
        }
        self.shared.signal.notify_all();
        true
    }

    /// Non-blocking check (only contends with the short queue critical section)
    pub fn is_set(&self) -> bool {
        self.shared.state.lock().shutdown
    }
}
