//! Worker - the single background writer
//!
//! State machine:
//! ```text
//! Idle -> Waiting -> Draining -> Waiting -> ... -> Terminated
//! ```
//! - Waiting: blocked in `ResultQueue::wait_for_work` (the only suspension point)
//! - Draining: writing every value returned by `drain_all`, in order
//! - Terminated: reached only after a drain, when the latch is set and the
//!   queue is observed empty under the queue lock
//!
//! Termination is decided from the current latch and queue state after each
//! drain, never from which condition ended the wait.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::common::{PendingResult, SinkError, WriterCounters};
use crate::queue::ResultQueue;
use crate::sink::ResultSink;

/// Callback invoked on the worker thread for every reported write error
pub type ErrorHook = Arc<dyn Fn(&SinkError) + Send + Sync>;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Worker thread not started yet
    Idle,
    /// Blocked waiting for work or shutdown
    Waiting,
    /// Writing a drained batch
    Draining,
    /// Loop exited; terminal
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "Idle"),
            WorkerState::Waiting => write!(f, "Waiting"),
            WorkerState::Draining => write!(f, "Draining"),
            WorkerState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Observable worker state with a termination wait
#[derive(Debug)]
pub struct StateCell {
    state: Mutex<WorkerState>,
    changed: Condvar,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WorkerState::Idle),
            changed: Condvar::new(),
        }
    }

    pub fn get(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Transition; no-op once Terminated
    pub fn set(&self, next: WorkerState) {
        {
            let mut state = self.state.lock();
            if *state == WorkerState::Terminated {
                return;
            }
            *state = next;
        }
        self.changed.notify_all();
    }

    /// Wait up to `timeout` for Terminated; returns whether it was reached
    pub fn wait_terminated(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state != WorkerState::Terminated {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        *state == WorkerState::Terminated
    }
}

/// Publishes Terminated when the worker exits, including by panic
struct TerminateOnExit(Arc<StateCell>);

impl Drop for TerminateOnExit {
    fn drop(&mut self) {
        self.0.set(WorkerState::Terminated);
    }
}

/// Background writer bound to one queue and one sink
pub struct Worker<S: ResultSink> {
    queue: ResultQueue,
    sink: S,
    state: Arc<StateCell>,
    counters: Arc<WriterCounters>,
    on_error: Option<ErrorHook>,
}

impl<S: ResultSink> Worker<S> {
    pub fn new(
        queue: ResultQueue,
        sink: S,
        state: Arc<StateCell>,
        counters: Arc<WriterCounters>,
    ) -> Self {
        Self {
            queue,
            sink,
            state,
            counters,
            on_error: None,
        }
    }

    pub fn with_error_hook(mut self, hook: Option<ErrorHook>) -> Self {
        self.on_error = hook;
        self
    }

    /// Run until the latch is set and everything queued has been written
    ///
    /// Returns the sink so the owner can release it after termination.
    pub fn run(mut self) -> S {
        let _terminated = TerminateOnExit(self.state.clone());
        info!(sink = self.sink.name(), "Result writer worker started");

        loop {
            self.state.set(WorkerState::Waiting);
            let reason = self.queue.wait_for_work();

            self.state.set(WorkerState::Draining);
            let batch = self.queue.drain_all();
            if !batch.is_empty() {
                self.counters.inc_batches();
                debug!(
                    reason = %reason,
                    size = batch.len(),
                    first_seq = batch[0].seq,
                    "Draining batch"
                );
            }
            for pending in batch {
                self.write_one(pending);
            }

            if self.queue.is_finished() {
                break;
            }
        }

        let stats = self.counters.snapshot();
        info!(
            written = stats.written,
            failed = stats.failed,
            batches = stats.batches,
            "Result writer worker terminated"
        );
        self.sink
    }

    fn write_one(&mut self, pending: PendingResult) {
        match self.sink.write(pending.value) {
            Ok(()) => self.counters.inc_written(),
            Err(e) if e.delivered() => {
                self.counters.inc_written();
                self.counters.inc_partial_failures();
                warn!(seq = pending.seq, value = pending.value, error = %e, "Result partially delivered");
                self.report(&e);
            }
            Err(e @ SinkError::AllFailed { .. }) => {
                self.counters.inc_failed();
                error!(seq = pending.seq, value = pending.value, error = %e, "Every sink failed to write result");
                self.report(&e);
            }
            Err(e) => {
                self.counters.inc_failed();
                warn!(seq = pending.seq, value = pending.value, error = %e, "Failed to write result");
                self.report(&e);
            }
        }
    }

    fn report(&self, error: &SinkError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SinkResult;
    use crate::sink::MemorySink;
    use std::thread;

    struct FailOn {
        bad: i64,
        inner: MemorySink,
    }

    impl ResultSink for FailOn {
        fn name(&self) -> &str {
            "fail-on"
        }

        fn write(&mut self, value: i64) -> SinkResult<()> {
            if value == self.bad {
                return Err(SinkError::rejected("fail-on", value, "injected"));
            }
            self.inner.write(value)
        }
    }

    fn parts() -> (ResultQueue, Arc<StateCell>, Arc<WriterCounters>) {
        (
            ResultQueue::new(),
            Arc::new(StateCell::new()),
            Arc::new(WriterCounters::new()),
        )
    }

    #[test]
    fn test_state_cell_terminal_is_sticky() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), WorkerState::Idle);
        cell.set(WorkerState::Terminated);
        cell.set(WorkerState::Waiting);
        assert_eq!(cell.get(), WorkerState::Terminated);
        assert!(cell.wait_terminated(Duration::ZERO));
    }

    #[test]
    fn test_state_cell_wait_times_out() {
        let cell = StateCell::new();
        cell.set(WorkerState::Waiting);
        assert!(!cell.wait_terminated(Duration::from_millis(20)));
    }

    #[test]
    fn test_run_drains_everything_queued_before_latch() {
        let (queue, state, counters) = parts();
        let sink = MemorySink::new("mem");
        for v in [10, 20, 30] {
            queue.enqueue(v).unwrap();
        }
        queue.latch().signal();

        let worker = Worker::new(queue.clone(), sink.clone(), state.clone(), counters.clone());
        worker.run();

        assert_eq!(sink.lines(), vec!["Result: 10", "Result: 20", "Result: 30"]);
        assert_eq!(state.get(), WorkerState::Terminated);
        assert_eq!(counters.snapshot().written, 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_run_terminates_on_latch_with_empty_queue() {
        let (queue, state, counters) = parts();
        queue.latch().signal();
        Worker::new(queue, MemorySink::default(), state.clone(), counters.clone()).run();
        assert_eq!(state.get(), WorkerState::Terminated);
        assert_eq!(counters.snapshot().batches, 0);
    }

    #[test]
    fn test_failed_value_does_not_stop_batch() {
        let (queue, state, counters) = parts();
        let inner = MemorySink::new("mem");
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = errors.clone();
        let hook: ErrorHook = Arc::new(move |e: &SinkError| seen.lock().push(e.to_string()));

        for v in [10, 20, 30] {
            queue.enqueue(v).unwrap();
        }
        queue.latch().signal();

        let sink = FailOn {
            bad: 20,
            inner: inner.clone(),
        };
        Worker::new(queue, sink, state, counters.clone())
            .with_error_hook(Some(hook))
            .run();

        assert_eq!(inner.lines(), vec!["Result: 10", "Result: 30"]);
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("20"));
        let stats = counters.snapshot();
        assert_eq!(stats.written, 2);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn test_total_failure_counts_as_failed() {
        use crate::sink::CompositeSink;

        struct Down(&'static str);

        impl ResultSink for Down {
            fn name(&self) -> &str {
                self.0
            }

            fn write(&mut self, value: i64) -> SinkResult<()> {
                Err(SinkError::rejected(self.0, value, "down"))
            }
        }

        let (queue, state, counters) = parts();
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let seen = kinds.clone();
        let hook: ErrorHook = Arc::new(move |e: &SinkError| {
            seen.lock()
                .push(matches!(e, SinkError::AllFailed { .. }));
        });

        queue.enqueue(1).unwrap();
        queue.latch().signal();

        let children: Vec<Box<dyn ResultSink>> = vec![Box::new(Down("a")), Box::new(Down("b"))];
        Worker::new(queue, CompositeSink::new(children), state, counters.clone())
            .with_error_hook(Some(hook))
            .run();

        assert_eq!(*kinds.lock(), vec![true]);
        let stats = counters.snapshot();
        assert_eq!(stats.written, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.partial_failures, 0);
    }

    #[test]
    fn test_worker_thread_processes_live_submissions() {
        let (queue, state, counters) = parts();
        let sink = MemorySink::new("mem");
        let worker = Worker::new(queue.clone(), sink.clone(), state.clone(), counters);
        let handle = thread::spawn(move || worker.run());

        for v in 0..100 {
            queue.enqueue(v).unwrap();
        }
        queue.latch().signal();
        assert!(state.wait_terminated(Duration::from_secs(5)));
        handle.join().unwrap();

        let expected: Vec<String> = (0..100).map(|v| format!("Result: {}", v)).collect();
        assert_eq!(sink.lines(), expected);
    }

    #[test]
    fn test_terminated_published_on_panic() {
        struct Panicking;

        impl ResultSink for Panicking {
            fn name(&self) -> &str {
                "panicking"
            }

            fn write(&mut self, _value: i64) -> SinkResult<()> {
                panic!("sink exploded");
            }
        }

        let (queue, state, counters) = parts();
        queue.enqueue(1).unwrap();
        let worker = Worker::new(queue, Panicking, state.clone(), counters);
        let handle = thread::spawn(move || worker.run());

        assert!(state.wait_terminated(Duration::from_secs(5)));
        assert!(handle.join().is_err());
    }
}
