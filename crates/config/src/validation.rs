//! Configuration validation
//!
//! Validates what can be checked without talking to ClickHouse:
//! - Connection URL is present and uses the HTTP interface
//! - Database is named
//! - Timeouts are non-zero
//! - Fixed fields do not shadow the columns the sink manages itself

use crate::Config;
use crate::error::{ConfigError, Result};

/// Column names populated by the sink for every entry
const RESERVED_FIELDS: &[&str] = &["level", "message", "time"];

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_clickhouse(config)?;
    validate_fields(config)?;
    Ok(())
}

/// Validate ClickHouse connection settings
fn validate_clickhouse(config: &Config) -> Result<()> {
    let ch = &config.clickhouse;

    if ch.url.trim().is_empty() {
        return Err(ConfigError::missing_field("clickhouse", "url"));
    }

    if !ch.url.starts_with("http://") && !ch.url.starts_with("https://") {
        return Err(ConfigError::invalid_value(
            "clickhouse",
            "url",
            format!("'{}' must start with http:// or https://", ch.url),
        ));
    }

    if ch.database.trim().is_empty() {
        return Err(ConfigError::missing_field("clickhouse", "database"));
    }

    if ch.connection_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "clickhouse",
            "connection_timeout",
            "must be greater than zero",
        ));
    }

    if ch.statement_timeout.is_some_and(|t| t.is_zero()) {
        return Err(ConfigError::invalid_value(
            "clickhouse",
            "statement_timeout",
            "must be greater than zero",
        ));
    }

    Ok(())
}

/// Validate fixed fields
fn validate_fields(config: &Config) -> Result<()> {
    if let Some(name) = config
        .fields
        .keys()
        .find(|name| RESERVED_FIELDS.contains(&name.as_str()))
    {
        return Err(ConfigError::invalid_value(
            "fields",
            name.clone(),
            "is managed by the sink and cannot be set as a fixed field",
        ));
    }

    Ok(())
}
