//! Composite sink - fan-out to a fixed ordered set of children

use tracing::warn;

use super::ResultSink;
use crate::common::{SinkError, SinkResult};

/// Forwards every value to each child in registration order
///
/// A failing child never prevents delivery to the children after it. When
/// some children fail the write returns [`SinkError::PartialFailure`], which
/// still counts as written; when all fail it returns [`SinkError::AllFailed`].
pub struct CompositeSink {
    children: Vec<Box<dyn ResultSink>>,
}

impl CompositeSink {
    /// Children are written in the order given here; the set is fixed
    pub fn new(children: Vec<Box<dyn ResultSink>>) -> Self {
        Self { children }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child names in write order
    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name()).collect()
    }
}

impl ResultSink for CompositeSink {
    fn name(&self) -> &str {
        "composite"
    }

    fn write(&mut self, value: i64) -> SinkResult<()> {
        let total = self.children.len();
        let mut failures = Vec::new();

        for child in self.children.iter_mut() {
            if let Err(e) = child.write(value) {
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else if failures.len() == total {
            Err(SinkError::AllFailed { value, failures })
        } else {
            Err(SinkError::PartialFailure {
                value,
                delivered: total - failures.len(),
                total,
                failures,
            })
        }
    }

    fn close(&mut self) -> SinkResult<()> {
        let mut failures = Vec::new();

        for child in self.children.iter_mut() {
            if let Err(e) = child.close() {
                warn!(sink = child.name(), error = %e, "Failed to close child sink");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::CloseFailed { failures })
        }
    }
}
