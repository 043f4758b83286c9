//! Configuration module for the result writer
//!
//! Supports loading configuration from a TOML file. Sinks are wired
//! explicitly from the `[[sinks]]` list: one entry is used directly, several
//! are wrapped in a [`CompositeSink`] in declaration order.
//!
//! # Example
//! ```ignore
//! let config = Config::load("writer.toml")?;
//! let controller = LifecycleController::spawn(config.build_sink()?, config.writer_config())?;
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::lifecycle::{WriterConfig, DEFAULT_THREAD_NAME};
use crate::sink::{CompositeSink, ConsoleSink, FileSink, ResultSink};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("No sinks configured")]
    NoSinks,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub writer: WriterFileConfig,

    /// Destinations, in write order
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            writer: WriterFileConfig::default(),
            sinks: default_sinks(),
        }
    }
}

/// `[writer]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WriterFileConfig {
    /// Worker thread name
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// Shutdown wait in milliseconds (default: 1000)
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for WriterFileConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

/// One `[[sinks]]` entry
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Append-only result file
    File {
        #[serde(default = "default_output_path")]
        path: PathBuf,
    },
    /// Standard output
    Console,
}

impl SinkConfig {
    fn build(&self) -> Box<dyn ResultSink> {
        match self {
            SinkConfig::File { path } => Box::new(FileSink::new(path)),
            SinkConfig::Console => Box::new(ConsoleSink::new()),
        }
    }
}

fn default_thread_name() -> String {
    DEFAULT_THREAD_NAME.to_string()
}

fn default_shutdown_timeout_ms() -> u64 {
    1000
}

fn default_output_path() -> PathBuf {
    PathBuf::from(crate::sink::DEFAULT_OUTPUT_FILE)
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig::File {
        path: default_output_path(),
    }]
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sinks.is_empty() {
            return Err(ConfigError::NoSinks);
        }
        if self.writer.thread_name.trim().is_empty() {
            return Err(ConfigError::invalid("writer.thread_name", "must not be empty"));
        }
        if self.writer.thread_name.contains('\0') {
            return Err(ConfigError::invalid(
                "writer.thread_name",
                "must not contain NUL bytes",
            ));
        }
        if self.writer.shutdown_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "writer.shutdown_timeout_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Apply command line overrides
    ///
    /// `output` replaces the configured sinks with a single file sink;
    /// `console` appends a console sink unless one is already configured.
    pub fn apply_overrides(
        &mut self,
        output: Option<PathBuf>,
        console: bool,
        timeout_ms: Option<u64>,
    ) {
        if let Some(path) = output {
            self.sinks = vec![SinkConfig::File { path }];
        }
        if console && !self.sinks.contains(&SinkConfig::Console) {
            self.sinks.push(SinkConfig::Console);
        }
        if let Some(ms) = timeout_ms {
            self.writer.shutdown_timeout_ms = ms;
        }
    }

    /// Shutdown wait as a Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.writer.shutdown_timeout_ms)
    }

    /// Controller settings
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            thread_name: self.writer.thread_name.clone(),
            shutdown_timeout: self.shutdown_timeout(),
        }
    }

    /// Construct the configured sink
    pub fn build_sink(&self) -> Result<Box<dyn ResultSink>, ConfigError> {
        match self.sinks.as_slice() {
            [] => Err(ConfigError::NoSinks),
            [only] => Ok(only.build()),
            many => Ok(Box::new(CompositeSink::new(
                many.iter().map(SinkConfig::build).collect(),
            ))),
        }
    }
}
