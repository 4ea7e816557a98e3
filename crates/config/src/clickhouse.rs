//! ClickHouse connection configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// ClickHouse connection settings
///
/// # Example
///
/// ```toml
/// [clickhouse]
/// url = "http://localhost:8123"
/// database = "default"
/// username = "default"
/// password = ""
/// connection_timeout = "5s"
/// statement_timeout = "60s"
///
/// [clickhouse.settings]
/// max_execution_time = 60
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL
    /// Default: "http://localhost:8123"
    pub url: String,

    /// Database name
    /// Default: "default"
    pub database: String,

    /// Username for authentication
    pub username: Option<String>,

    /// Password for authentication
    pub password: Option<String>,

    /// Time allowed for the startup connectivity check
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Deadline for each statement (table creation and every insert)
    /// Default: none
    #[serde(with = "humantime_serde")]
    pub statement_timeout: Option<Duration>,

    /// Server settings sent with every query (e.g. max_execution_time)
    #[serde(deserialize_with = "settings_as_strings")]
    pub settings: BTreeMap<String, String>,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            username: None,
            password: None,
            connection_timeout: Duration::from_secs(5),
            statement_timeout: None,
            settings: BTreeMap::new(),
        }
    }
}

/// Accept any scalar TOML value for a setting and keep its text form
fn settings_as_strings<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}
