//! Command implementations for the loghook CLI

pub mod clear;
pub mod emit;
pub mod init;

use loghook_config::{Config, TableConfig};
use loghook_sinks::clickhouse::{ClickHouseConfig, TableDescription};

/// Connection settings for the sink from the `[clickhouse]` section
pub fn sink_config(config: &Config) -> ClickHouseConfig {
    let ch = &config.clickhouse;
    let mut sink = ClickHouseConfig::default()
        .with_url(&ch.url)
        .with_database(&ch.database)
        .with_connection_timeout(ch.connection_timeout)
        .with_statement_timeout(ch.statement_timeout);

    if let Some(username) = &ch.username {
        sink = sink.with_credentials(username, ch.password.clone().unwrap_or_default());
    }

    for (name, value) in &ch.settings {
        sink = sink.with_setting(name, value);
    }

    sink
}

/// Table description from the `[table]` section (not yet validated)
pub fn table_description(table: &TableConfig) -> TableDescription {
    TableDescription {
        name: table.name.clone(),
        engine: table.engine.clone(),
        columns: table.columns.clone(),
        primary_keys: table.primary_keys.clone(),
        order_keys: table.order_keys.clone(),
    }
}
