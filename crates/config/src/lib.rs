//! loghook Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the destination table has to be described; everything else falls
//! back to a local ClickHouse and console logging.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use loghook_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[table]\nname = \"app_log\"").unwrap();
//! assert_eq!(config.table.name, "app_log");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [clickhouse]
//! url = "http://localhost:8123"
//! database = "default"
//! connection_timeout = "5s"
//!
//! [clickhouse.settings]
//! max_execution_time = 60
//!
//! [table]
//! name = "app_log"
//! engine = "MergeTree"
//! primary_keys = ["id"]
//! order_keys = ["id", "log_id"]
//!
//! [table.columns]
//! id = "UInt32"
//! log_id = "String"
//!
//! [fields]
//! service = "billing"
//! ```

mod clickhouse;
mod error;
mod logging;
mod table;
mod validation;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use clickhouse::ClickHouseConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use table::TableConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagnostic logging configuration
    pub log: LogConfig,

    /// ClickHouse connection settings
    pub clickhouse: ClickHouseConfig,

    /// Destination table description
    pub table: TableConfig,

    /// Fixed fields attached to every log entry
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
