//! Console sink - human-readable log lines

use std::io::{self, Write};

use tracing::debug;

use super::ResultSink;
use crate::common::SinkResult;

/// Writes `Log Result: <value>` to a stream (stdout by default)
///
/// Stream errors are logged and swallowed; this sink never fails.
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleSink<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Write to an arbitrary stream instead of stdout
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ResultSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&mut self, value: i64) -> SinkResult<()> {
        if let Err(e) = writeln!(self.out, "Log Result: {}", value).and_then(|_| self.out.flush()) {
            debug!(error = %e, value, "Console write failed");
        }
        Ok(())
    }
}
