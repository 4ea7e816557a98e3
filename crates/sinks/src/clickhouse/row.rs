//! Log rows
//!
//! Maps an [`Entry`] onto the declared columns of a table and renders the
//! single-row insert for it.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde_json::Value;

use crate::entry::Entry;

use super::schema::TableDescription;
use super::store::Statement;

/// Format of the `time` column (ClickHouse `DateTime` text form)
///
/// The column has no explicit zone, so ClickHouse reads the text as
/// wall-clock time; rows carry the producing host's local time.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row destined for the log table
///
/// Holds only declared columns the entry actually supplied, plus `time`,
/// `level` and `message`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    values: BTreeMap<String, Value>,
}

impl LogRow {
    /// Build a row from an entry
    ///
    /// Fields not declared in `table.columns` are dropped; declared columns
    /// the entry does not carry are left out rather than null-filled.
    pub fn from_entry(table: &TableDescription, entry: &Entry) -> Self {
        let mut values: BTreeMap<String, Value> = table
            .columns
            .keys()
            .filter_map(|column| {
                entry
                    .fields
                    .get(column)
                    .map(|value| (column.clone(), value.clone()))
            })
            .collect();

        values.insert("time".into(), Value::String(format_time(&entry.time)));
        values.insert("level".into(), Value::String(entry.level.as_str().into()));
        values.insert("message".into(), Value::String(entry.message.clone()));

        Self { values }
    }

    /// Value of a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Whether the row carries a column
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Column names, in the row's enumeration order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for rows built by [`from_entry`](Self::from_entry)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the single-row insert
    ///
    /// Column and value lists come from one pass over the row, so they
    /// always line up. Every value is bound as text.
    pub fn insert_statement(&self, table: &str) -> Statement {
        let mut columns = Vec::with_capacity(self.values.len());
        let mut params = Vec::with_capacity(self.values.len());

        for (column, value) in &self.values {
            columns.push(literal(column));
            params.push(value_as_text(value));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO `{}` ({}) VALUES ({})",
            literal(&table.replace('`', "\\`")),
            columns.join(", "),
            placeholders
        );

        params
            .into_iter()
            .fold(Statement::new(sql), |stmt, param| stmt.bind(param))
    }
}

/// Identifier text inside a parameterized statement (`?` doubled)
fn literal(name: &str) -> String {
    name.replace('?', "??")
}

/// Text written to the `time` column: local wall-clock time
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// Text form of a field value; strings are taken as-is, not JSON-quoted
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
