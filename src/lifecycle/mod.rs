//! LifecycleController - producer-facing handle for the background writer
//!
//! Architecture:
//! - `start` spawns exactly one named OS thread running [`Worker::run`]
//! - `submit` / [`Submitter::submit`] append to the shared [`ResultQueue`]
//! - `shutdown` sets the latch, waits (bounded) for Terminated, joins the
//!   thread and closes the sink it hands back
//!
//! Submission policy: once shutdown has been initiated every submission is
//! rejected with [`LifecycleError::SubmitAfterShutdown`]. Values accepted
//! before that point are always written before the worker terminates.
//!
//! On timeout the worker is never killed: it keeps draining detached and
//! the sink is released by the thread itself when it finishes.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use crate::common::{LifecycleError, LifecycleResult, SinkError, WriterCounters, WriterStats};
use crate::queue::{ResultQueue, ShutdownLatch};
use crate::sink::ResultSink;
use crate::worker::{ErrorHook, StateCell, Worker, WorkerState};

/// Default worker thread name
pub const DEFAULT_THREAD_NAME: &str = "result-writer";

/// Default wait used when the controller is dropped without explicit shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Writer configuration
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Name of the worker OS thread
    pub thread_name: String,
    /// Wait applied by `Drop`
    pub shutdown_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Result of a successful shutdown call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// This call observed the worker terminate and released the sink
    Terminated,
    /// A previous call already completed shutdown
    AlreadyTerminated,
}

/// Cloneable producer handle
#[derive(Clone)]
pub struct Submitter {
    queue: ResultQueue,
    counters: Arc<WriterCounters>,
}

impl Submitter {
    /// Queue a value; returns its FIFO sequence number
    pub fn submit(&self, value: i64) -> LifecycleResult<u64> {
        match self.queue.enqueue(value) {
            Ok(pending) => {
                self.counters.inc_submitted();
                Ok(pending.seq)
            }
            Err(e) => {
                self.counters.inc_rejected();
                Err(e)
            }
        }
    }
}

/// Owns the worker thread, the queue and (outside the worker's run) the sink
///
/// Dropping the controller performs `shutdown(config.shutdown_timeout)` if
/// it has not completed yet.
pub struct LifecycleController {
    config: WriterConfig,
    queue: ResultQueue,
    latch: ShutdownLatch,
    state: Arc<StateCell>,
    counters: Arc<WriterCounters>,
    on_error: Option<ErrorHook>,
    sink: Option<Box<dyn ResultSink>>,
    handle: Option<JoinHandle<Box<dyn ResultSink>>>,
    started: bool,
    finished: bool,
}

impl LifecycleController {
    /// Wire a controller around `sink` without starting the worker
    pub fn new(sink: impl ResultSink + 'static, config: WriterConfig) -> Self {
        let queue = ResultQueue::new();
        let latch = queue.latch();
        Self {
            config,
            queue,
            latch,
            state: Arc::new(StateCell::new()),
            counters: Arc::new(WriterCounters::new()),
            on_error: None,
            sink: Some(Box::new(sink)),
            handle: None,
            started: false,
            finished: false,
        }
    }

    /// `new` followed by `start`
    pub fn spawn(sink: impl ResultSink + 'static, config: WriterConfig) -> LifecycleResult<Self> {
        let mut controller = Self::new(sink, config);
        controller.start()?;
        Ok(controller)
    }

    /// Install a callback for every write error the worker reports
    ///
    /// The worker captures the hook when it starts, so this fails with
    /// [`LifecycleError::AlreadyStarted`] once `start` has run.
    pub fn with_error_hook<F>(mut self, hook: F) -> LifecycleResult<Self>
    where
        F: Fn(&SinkError) + Send + Sync + 'static,
    {
        if self.started {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.on_error = Some(Arc::new(hook));
        Ok(self)
    }

    /// Spawn the worker thread
    ///
    /// Fails with [`LifecycleError::AlreadyStarted`] on a second call or after
    /// shutdown.
    pub fn start(&mut self) -> LifecycleResult<()> {
        if self.started {
            return Err(LifecycleError::AlreadyStarted);
        }
        // Builder::spawn panics on an interior NUL
        if self.config.thread_name.contains('\0') {
            return Err(LifecycleError::Spawn(io::Error::new(
                io::ErrorKind::InvalidInput,
                "thread name contains a NUL byte",
            )));
        }
        let sink = self.sink.take().ok_or(LifecycleError::AlreadyStarted)?;

        let worker = Worker::new(
            self.queue.clone(),
            sink,
            self.state.clone(),
            self.counters.clone(),
        )
        .with_error_hook(self.on_error.clone());

        match thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run())
        {
            Ok(handle) => {
                self.handle = Some(handle);
                self.started = true;
                info!(thread = %self.config.thread_name, "Result writer started");
                Ok(())
            }
            Err(e) => {
                // The sink went down with the worker; nothing can be written
                // any more, so close the queue before anyone can submit.
                self.latch.signal();
                self.state.set(WorkerState::Terminated);
                warn!(error = %e, "Failed to spawn result writer thread");
                Err(LifecycleError::Spawn(e))
            }
        }
    }

    /// Queue a value for writing; returns its FIFO sequence number
    pub fn submit(&self, value: i64) -> LifecycleResult<u64> {
        if !self.started {
            return Err(LifecycleError::NotStarted);
        }
        self.submitter_unchecked().submit(value)
    }

    /// Producer handle usable from other threads
    pub fn submitter(&self) -> LifecycleResult<Submitter> {
        if !self.started {
            return Err(LifecycleError::NotStarted);
        }
        Ok(self.submitter_unchecked())
    }

    fn submitter_unchecked(&self) -> Submitter {
        Submitter {
            queue: self.queue.clone(),
            counters: self.counters.clone(),
        }
    }

    /// Request shutdown and wait up to `timeout` for the worker to finish
    ///
    /// Idempotent: after a completed shutdown further calls return
    /// [`ShutdownOutcome::AlreadyTerminated`]. After a timeout a later call
    /// waits again for the still-running worker.
    pub fn shutdown(&mut self, timeout: Duration) -> LifecycleResult<ShutdownOutcome> {
        if self.finished {
            return Ok(ShutdownOutcome::AlreadyTerminated);
        }

        if self.latch.signal() {
            info!(pending = self.queue.len(), "Shutdown requested");
        }

        let Some(handle) = self.handle.take() else {
            // No worker: anything still queued can never be written
            let pending = self.queue.len();
            if pending > 0 {
                return Err(LifecycleError::Undelivered { pending });
            }
            self.started = true;
            self.finished = true;
            if let Some(mut sink) = self.sink.take() {
                sink.close().map_err(LifecycleError::SinkClose)?;
            }
            return Ok(ShutdownOutcome::Terminated);
        };

        if !self.state.wait_terminated(timeout) {
            let pending = self.queue.len();
            warn!(?timeout, pending, "Result writer did not terminate in time");
            self.handle = Some(handle);
            return Err(LifecycleError::ShutdownTimeout { timeout, pending });
        }

        self.finished = true;
        let mut sink = handle.join().map_err(|_| LifecycleError::WorkerPanicked)?;
        sink.close().map_err(LifecycleError::SinkClose)?;

        info!(stats = %self.stats().summary(), "Result writer stopped");
        Ok(ShutdownOutcome::Terminated)
    }

    /// Give up waiting for a worker that timed out
    ///
    /// The thread keeps draining on its own and drops its sink when it
    /// finishes; `Drop` no longer waits for it. No-op once shut down.
    pub fn detach(&mut self) {
        if self.finished {
            return;
        }
        self.latch.signal();
        self.finished = true;
        if self.handle.take().is_some() {
            warn!(pending = self.queue.len(), "Result writer detached");
        }
    }

    /// Current worker state (`Idle` before start)
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Counter snapshot
    pub fn stats(&self) -> WriterStats {
        self.counters.snapshot()
    }

    /// Values accepted but not yet drained by the worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.latch.is_set()
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // On timeout the join handle is dropped with `self`, detaching the
        // worker; its sink is dropped (not closed) when the thread exits.
        if let Err(e) = self.shutdown(self.config.shutdown_timeout) {
            warn!(error = %e, "Result writer shutdown on drop failed");
        }
    }
}
