//! ClickHouse hook errors

use std::time::Duration;

/// Malformed table description
///
/// Checks run in a fixed order and the first failure wins; the message is
/// the human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("table name should not be empty")]
    EmptyName,

    #[error("table engine should not be empty")]
    EmptyEngine,

    #[error("table columns are not defined")]
    NoColumns,

    #[error("table primary keys are not defined")]
    NoPrimaryKeys,

    #[error("table order by keys are not defined")]
    NoOrderKeys,

    #[error("primary key '{0}' is not contained in columns")]
    UnknownPrimaryKey(String),

    #[error("order key '{0}' is not contained in columns")]
    UnknownOrderKey(String),

    #[error("column '{0}' is reserved and added automatically")]
    ReservedColumn(String),
}

/// Failure executing a statement against the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// ClickHouse client error (network, auth, server-side rejection)
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    /// The connection's cancellation token fired
    #[error("statement cancelled")]
    Cancelled,

    /// The statement outlived its deadline
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// Store-specific failure (used by non-ClickHouse stores)
    #[error("store error: {0}")]
    Other(String),
}

/// Failure building a [`ClickHouseHook`](super::ClickHouseHook)
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The table description is malformed
    #[error("invalid table description: {0}")]
    Validation(#[from] ValidationError),

    /// ClickHouse could not be reached
    #[error("cannot connect to clickhouse at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: StoreError,
    },

    /// The destination table could not be created
    #[error("cannot create table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: StoreError,
    },
}

/// Failure inside one insert unit; only ever reported, never returned
#[derive(Debug, thiserror::Error)]
pub enum DeliveryFault {
    /// The insert statement failed
    #[error("insert failed: {0}")]
    Store(#[from] StoreError),

    /// The insert unit panicked
    #[error("insert unit panicked: {0}")]
    Panicked(String),

    /// The runtime dropped the insert unit before it finished
    #[error("insert unit aborted before completion")]
    Aborted,
}
