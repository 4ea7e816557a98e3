//! Log entry model handed to hooks
//!
//! An [`Entry`] is one structured log event: severity, message, creation
//! time and the fields attached at the call site.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Severity of a log entry
///
/// Stored in ClickHouse as its lowercase text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
    Critical,
}

impl Level {
    /// Every level, least to most severe
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
        Level::Critical,
    ];

    /// Text rendering written to the `level` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Critical => "critical",
        }
    }

    /// Map a `tracing` level (TRACE folds into debug)
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown level name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Case-insensitive, accepts common aliases (`warn`, `panic`, `crit`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "critical" | "crit" | "panic" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// One structured log event
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Wall-clock time the entry was created
    pub time: DateTime<Utc>,
    /// Severity
    pub level: Level,
    /// Free-text message
    pub message: String,
    /// Fields attached by the caller
    pub fields: BTreeMap<String, Value>,
}

impl Entry {
    /// Create an entry stamped with the current time and no fields
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field, replacing any previous value under the same name
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Override the creation time
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}
