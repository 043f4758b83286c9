//! E2E tests for the result file (submit → shutdown → read back)

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use result_writer::config::Config;
use result_writer::lifecycle::{LifecycleController, WriterConfig};
use result_writer::sink::{CompositeSink, FileSink, ResultSink};

const WAIT: Duration = Duration::from_secs(5);

/// Unique temp path per test; removed on drop
struct TempFile(PathBuf);

impl TempFile {
    fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "result_writer_e2e_{}_{}.txt",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        Self(path)
    }

    fn read(&self) -> String {
        fs::read_to_string(&self.0).unwrap()
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn run_once(path: &PathBuf, values: &[i64]) {
    let mut controller =
        LifecycleController::spawn(FileSink::new(path), WriterConfig::default()).unwrap();
    for &v in values {
        controller.submit(v).unwrap();
    }
    controller.shutdown(WAIT).unwrap();
}

#[test]
fn file_contains_exactly_the_submitted_results() {
    let file = TempFile::new("exact");
    run_once(&file.0, &[10, 20, 30]);
    assert_eq!(file.read(), "Result: 10\nResult: 20\nResult: 30\n");
}

#[test]
fn file_is_appended_across_runs() {
    let file = TempFile::new("append");
    run_once(&file.0, &[10]);
    run_once(&file.0, &[20, 30]);
    assert_eq!(file.read(), "Result: 10\nResult: 20\nResult: 30\n");
}

#[test]
fn no_values_means_no_file() {
    let file = TempFile::new("empty");
    run_once(&file.0, &[]);
    assert!(!file.0.exists());
}

#[test]
fn composite_writes_every_file_in_order() {
    let a = TempFile::new("fanout_a");
    let b = TempFile::new("fanout_b");
    let children: Vec<Box<dyn ResultSink>> =
        vec![Box::new(FileSink::new(&a.0)), Box::new(FileSink::new(&b.0))];

    let mut controller =
        LifecycleController::spawn(CompositeSink::new(children), WriterConfig::default())
            .unwrap();
    for v in [1, -2, 3] {
        controller.submit(v).unwrap();
    }
    controller.shutdown(WAIT).unwrap();

    let expected = "Result: 1\nResult: -2\nResult: 3\n";
    assert_eq!(a.read(), expected);
    assert_eq!(b.read(), expected);
}

#[test]
fn configured_sinks_are_wired_from_toml() {
    let file = TempFile::new("configured");
    let toml = format!(
        r#"
[writer]
thread_name = "e2e-writer"
shutdown_timeout_ms = 2000

[[sinks]]
kind = "file"
path = "{}"
"#,
        file.0.display()
    );
    let config = Config::from_toml(&toml).unwrap();

    let mut controller =
        LifecycleController::spawn(config.build_sink().unwrap(), config.writer_config()).unwrap();
    controller.submit(42).unwrap();
    controller.shutdown(config.shutdown_timeout()).unwrap();

    assert_eq!(file.read(), "Result: 42\n");
}
