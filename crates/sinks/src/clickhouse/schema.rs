//! Destination table schema
//!
//! Validates the operator's [`TableDescription`] and turns it into DDL.
//! Every table gets three extra columns managed by the hook itself:
//! `level`, `message` and `time`.

use std::collections::BTreeMap;

use super::error::{StoreError, ValidationError};
use super::store::{Connection, Statement};

/// Columns appended to every table, with their ClickHouse types
pub const RESERVED_COLUMNS: [(&str, &str); 3] = [
    ("level", "String"),
    ("message", "String"),
    ("time", "Datetime"),
];

/// Partitioning policy, fixed for every table
const PARTITION_BY: &str = "toYYYYMMDD(time)";

/// Whether `name` is one of the hook-managed columns
pub fn is_reserved(name: &str) -> bool {
    RESERVED_COLUMNS.iter().any(|(reserved, _)| *reserved == name)
}

/// Logical description of the destination table
///
/// Immutable once the hook is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    /// Table name
    pub name: String,
    /// Storage engine, passed through verbatim (e.g. "MergeTree")
    pub engine: String,
    /// Column name -> ClickHouse type, excluding reserved columns
    pub columns: BTreeMap<String, String>,
    /// Primary key columns, in order
    pub primary_keys: Vec<String>,
    /// Sorting key columns, in order
    pub order_keys: Vec<String>,
}

impl TableDescription {
    /// Start a description with a name and engine
    pub fn new(name: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: engine.into(),
            columns: BTreeMap::new(),
            primary_keys: Vec::new(),
            order_keys: Vec::new(),
        }
    }

    /// Declare a column
    pub fn column(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.columns.insert(name.into(), ty.into());
        self
    }

    /// Set the primary key
    pub fn primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sorting key
    pub fn order_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Run [`validate`] on this description
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self)
    }
}

/// Check a description, reporting the first failing rule
pub fn validate(table: &TableDescription) -> Result<(), ValidationError> {
    if table.name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if table.engine.is_empty() {
        return Err(ValidationError::EmptyEngine);
    }
    if table.columns.is_empty() {
        return Err(ValidationError::NoColumns);
    }
    if table.primary_keys.is_empty() {
        return Err(ValidationError::NoPrimaryKeys);
    }
    if table.order_keys.is_empty() {
        return Err(ValidationError::NoOrderKeys);
    }

    if let Some(key) = first_missing(&table.columns, &table.primary_keys) {
        return Err(ValidationError::UnknownPrimaryKey(key.to_string()));
    }
    if let Some(key) = first_missing(&table.columns, &table.order_keys) {
        return Err(ValidationError::UnknownOrderKey(key.to_string()));
    }

    if let Some(name) = table.columns.keys().find(|name| is_reserved(name)) {
        return Err(ValidationError::ReservedColumn(name.clone()));
    }

    Ok(())
}

fn first_missing<'a>(columns: &BTreeMap<String, String>, keys: &'a [String]) -> Option<&'a str> {
    keys.iter()
        .find(|key| !columns.contains_key(key.as_str()))
        .map(String::as_str)
}

/// Render the `CREATE TABLE IF NOT EXISTS` statement for a description
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS <name> (
///     <col> <type>, ..., level String, message String, time Datetime
/// ) ENGINE = <engine>
/// PARTITION BY toYYYYMMDD(time)
/// PRIMARY KEY (<primary_keys>)
/// ORDER BY (<order_keys>);
/// ```
pub fn create_table_statement(table: &TableDescription) -> Statement {
    let columns = table
        .columns
        .iter()
        .map(|(name, ty)| (name.as_str(), ty.as_str()))
        .chain(RESERVED_COLUMNS)
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect::<Vec<_>>()
        .join(", ");

    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {name} (\n    {columns}\n) ENGINE = {engine}\n\
         PARTITION BY {PARTITION_BY}\n\
         PRIMARY KEY ({primary})\n\
         ORDER BY ({order});",
        name = table.name,
        engine = table.engine,
        primary = table.primary_keys.join(", "),
        order = table.order_keys.join(", "),
    ))
}

/// Render the `DROP TABLE IF EXISTS` statement
pub fn drop_table_statement(name: &str) -> Statement {
    Statement::new(format!("DROP TABLE IF EXISTS {name};"))
}

/// Create the table if it does not exist yet
pub async fn ensure_table(conn: &Connection, table: &TableDescription) -> Result<(), StoreError> {
    conn.execute(&create_table_statement(table)).await?;
    tracing::debug!(table = %table.name, engine = %table.engine, "ensured table exists");
    Ok(())
}

/// Drop the table; succeeds if it is already gone
pub async fn drop_table(conn: &Connection, name: &str) -> Result<(), StoreError> {
    conn.execute(&drop_table_statement(name)).await?;
    tracing::info!(table = %name, "dropped table");
    Ok(())
}
