//! In-memory sink recording the same lines a file sink would write

use std::sync::Arc;

use parking_lot::Mutex;

use super::{format_line, ResultSink};
use crate::common::SinkResult;

/// Shared in-memory line buffer
///
/// Clones share the buffer, so one clone can be handed to the writer while
/// another is kept to inspect what was written.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    lines: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<u32>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(0)),
        }
    }

    /// Copy of all lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// How many times `close` has been called across all clones
    pub fn close_count(&self) -> u32 {
        *self.closed.lock()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl ResultSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, value: i64) -> SinkResult<()> {
        self.lines.lock().push(format_line(value));
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        *self.closed.lock() += 1;
        Ok(())
    }
}
