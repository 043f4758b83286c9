//! CLI argument parsing for the result writer binary
//!
//! # Design Principles (KISS)
//! - Use clap's derive macro for declarative argument definition
//! - Common arguments shared via composition, not inheritance

use std::path::PathBuf;

use clap::Parser;

/// Values submitted when neither positional values nor `--stdin` are given
pub const DEFAULT_VALUES: [i64; 3] = [10, 20, 30];

/// Common arguments
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short = 'f', long = "config", env = "RESULT_WRITER_CONFIG")]
    pub config_file: Option<String>,
}

/// Arguments for the result writer
#[derive(Parser, Debug, Clone)]
#[command(
    name = "result_writer",
    about = "Submit integer results to a background writer thread"
)]
pub struct ResultWriterArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Write results to this file (replaces configured sinks)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Also echo results to the console
    #[arg(long)]
    pub console: bool,

    /// Maximum time to wait for the writer to drain on shutdown
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Read one integer per line from stdin until EOF or Ctrl+C
    #[arg(long)]
    pub stdin: bool,

    /// Results to submit
    #[arg(allow_negative_numbers = true)]
    pub values: Vec<i64>,
}

impl ResultWriterArgs {
    /// Positional values, falling back to the demo values in batch mode
    pub fn values_to_submit(&self) -> Vec<i64> {
        if self.values.is_empty() && !self.stdin {
            DEFAULT_VALUES.to_vec()
        } else {
            self.values.clone()
        }
    }
}
