//! Logging configuration
//!
//! Controls the diagnostic logging of loghook itself: startup messages and
//! failed inserts. These never travel to ClickHouse.

use serde::Deserialize;

/// Targets of the HTTP/driver stack that are capped at `warn` unless the
/// configured level is `trace`
const NOISY_TARGETS: &[&str] = &["hyper", "hyper_util", "clickhouse"];

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level - very verbose, includes driver internals
    Trace,
    /// Debug level - every dispatched insert
    Debug,
    /// Info level - startup and shutdown (default)
    #[default]
    Info,
    /// Warn level - warnings only
    Warn,
    /// Error level - failed inserts only
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Write to stdout
    Stdout,
    /// Write to stderr (default)
    #[default]
    Stderr,
    /// Append to a file
    #[serde(untagged)]
    File(String),
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "info"
/// format = "console"
/// output = "stderr"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: info
    pub level: LogLevel,

    /// Output format (console, json)
    /// Default: console
    pub format: LogFormat,

    /// Output destination (stdout, stderr, or file path)
    /// Default: stderr
    pub output: LogOutput,
}

impl LogConfig {
    /// Build an `EnvFilter`-compatible directive for the given base level
    ///
    /// The driver stack is capped at `warn` so request-level chatter from
    /// the HTTP client does not drown the sink's own diagnostics.
    pub fn directive_for(level: &str) -> String {
        if level == LogLevel::Trace.as_str() {
            return level.to_string();
        }

        let mut directive = level.to_string();
        for target in NOISY_TARGETS {
            directive.push_str(&format!(",{target}=warn"));
        }
        directive
    }
}
