//! File sink - appends one line per result
//!
//! The file is opened in append mode for every write and closed again
//! immediately, so nothing is buffered in-process and `close` has nothing
//! to flush. The file is created if absent and appended to across runs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{format_line, ResultSink};
use crate::common::{SinkError, SinkResult};

/// Default output file name
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Append-only text file sink
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    name: String,
}

impl FileSink {
    /// Create a sink writing to `path`
    ///
    /// Nothing is opened until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_FILE)
    }
}

impl ResultSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, value: i64) -> SinkResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SinkError::write(&self.name, value, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SinkError::write(&self.name, value, e))?;

        writeln!(file, "{}", format_line(value))
            .map_err(|e| SinkError::write(&self.name, value, e))?;

        debug!(path = %self.path.display(), value, "Appended result");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "result_writer_file_sink_{}_{}.txt",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn test_name_contains_path() {
        let sink = FileSink::new("/data/output.txt");
        assert_eq!(sink.name(), "file:/data/output.txt");
        assert_eq!(sink.path(), Path::new("/data/output.txt"));
    }

    #[test]
    fn test_default_path() {
        assert_eq!(FileSink::default().path(), Path::new("output.txt"));
    }

    #[test]
    fn test_writes_one_line_per_value() {
        let path = temp_path("lines");
        let _ = fs::remove_file(&path);

        let mut sink = FileSink::new(&path);
        sink.write(10).unwrap();
        sink.write(20).unwrap();
        sink.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Result: 10\nResult: 20\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_appends_across_instances() {
        let path = temp_path("append");
        let _ = fs::remove_file(&path);

        FileSink::new(&path).write(1).unwrap();
        FileSink::new(&path).write(2).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Result: 1\nResult: 2\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("result_writer_nested_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("sub").join("out.txt");

        FileSink::new(&path).write(5).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Result: 5\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_path_reports_write_error() {
        // A directory cannot be opened for appending
        let dir = std::env::temp_dir();
        let mut sink = FileSink::new(&dir);

        let err = sink.write(7).unwrap_err();
        assert!(matches!(err, SinkError::Write { value: 7, .. }));
    }
}
