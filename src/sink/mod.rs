//! Sink abstraction - durable destinations for results
//!
//! Implementations:
//! - [`FileSink`]: appends `Result: <value>` lines, reopening per write
//! - [`ConsoleSink`]: writes `Log Result: <value>` to stdout, never fails
//! - [`MemorySink`]: records file-format lines in a shared buffer
//! - [`CompositeSink`]: fans each value out to a fixed ordered set of children
//!
//! A sink is owned by the worker thread while it runs and is closed by the
//! controller exactly once, after the worker has terminated.

mod composite;
mod console;
mod file;
mod memory;

pub use composite::CompositeSink;
pub use console::ConsoleSink;
pub use file::{FileSink, DEFAULT_OUTPUT_FILE};
pub use memory::MemorySink;

use crate::common::SinkResult;

/// A destination capable of persisting one value at a time
pub trait ResultSink: Send {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Persist one value
    fn write(&mut self, value: i64) -> SinkResult<()>;

    /// Release the underlying resource
    fn close(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, value: i64) -> SinkResult<()> {
        (**self).write(value)
    }

    fn close(&mut self) -> SinkResult<()> {
        (**self).close()
    }
}

/// Line layout of the result file (without the trailing newline)
pub fn format_line(value: i64) -> String {
    format!("Result: {}", value)
}
