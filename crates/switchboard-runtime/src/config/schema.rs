//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    /// Settings for `Buffered` workers.
    #[serde(default)]
    pub offload: OffloadConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SwitchboardConfig {
    /// Checks values serde cannot reject on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.offload.thread_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "offload.thread_name must not be empty",
            ));
        }
        if self.offload.thread_name.contains('\0') {
            return Err(ConfigError::validation(
                "offload.thread_name must not contain NUL bytes",
            ));
        }
        Ok(())
    }
}

/// Settings for an offload worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadConfig {
    /// Maximum number of jobs waiting to start; `0` means unbounded.
    ///
    /// A job submitted to a full queue is dropped.
    #[serde(default)]
    pub capacity: usize,

    /// Name of the worker thread.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            thread_name: default_thread_name(),
        }
    }
}

fn default_thread_name() -> String {
    "switchboard-offload".to_string()
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Needs the `json-log` feature; falls back to `compact` without it.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Show thread ids, so worker threads can be told apart.
    #[serde(default = "default_true")]
    pub thread_ids: bool,

    /// Show thread names.
    #[serde(default = "default_true")]
    pub thread_names: bool,

    /// Show source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `switchboard_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            thread_ids: true,
            thread_names: true,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
