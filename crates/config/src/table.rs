//! Destination table configuration
//!
//! Raw, unvalidated description of the table log entries are written to.
//! Structural checks (non-empty keys, key membership, reserved column names)
//! happen when the sink is built.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Table description as written by the operator
///
/// `level`, `message` and `time` columns are added automatically and must
/// not be listed under `columns`.
///
/// # Example
///
/// ```toml
/// [table]
/// name = "app_log"
/// engine = "MergeTree"
/// primary_keys = ["id"]
/// order_keys = ["id", "log_id"]
///
/// [table.columns]
/// id = "UInt32"
/// log_id = "String"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Destination table name
    pub name: String,

    /// Storage engine, passed through to DDL
    /// Default: "MergeTree"
    pub engine: String,

    /// Column name -> ClickHouse type
    pub columns: BTreeMap<String, String>,

    /// Primary key columns, in order
    pub primary_keys: Vec<String>,

    /// Sorting key columns, in order
    pub order_keys: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: "MergeTree".into(),
            columns: BTreeMap::new(),
            primary_keys: Vec::new(),
            order_keys: Vec::new(),
        }
    }
}
