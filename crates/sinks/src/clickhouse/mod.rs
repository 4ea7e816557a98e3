//! ClickHouse Sink - Log Table Hook
//!
//! Persists structured log entries into a single ClickHouse table whose
//! schema is described by the operator and created on startup.
//!
//! # Features
//!
//! - **Schema provisioning**: `CREATE TABLE IF NOT EXISTS` from a validated
//!   [`TableDescription`], partitioned by day
//! - **Reserved columns**: `level`, `message`, `time` added to every table
//! - **Column filtering**: entry fields not declared as columns are dropped
//! - **Fire-and-forget inserts**: one task per row, caller never waits
//! - **Failure containment**: insert errors and panics are logged and counted
//! - **Parameterized values**: every value is bound as escaped text
//! - **Cancellation**: one token and deadline govern every statement
//!
//! # Table Layout
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS <name> (
//!     <columns...>, level String, message String, time Datetime
//! ) ENGINE = <engine>
//! PARTITION BY toYYYYMMDD(time)
//! PRIMARY KEY (<primary_keys>)
//! ORDER BY (<order_keys>);
//! ```

mod config;
mod error;
mod metrics;
mod row;
pub mod schema;
mod sink;
mod store;

// Re-export public API
pub use config::{ClickHouseConfig, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_URL};
pub use error::{ConstructionError, DeliveryFault, StoreError, ValidationError};
pub use metrics::{HookMetrics, MetricsSnapshot};
pub use row::{LogRow, TIME_FORMAT};
pub use schema::{RESERVED_COLUMNS, TableDescription};
pub use sink::ClickHouseHook;
pub use store::{ClickHouseStore, Connection, Statement, Store};

#[cfg(test)]
pub(crate) mod test_support;




#[cfg(test)]
#[path = "clickhouse_test.rs"]
mod clickhouse_test;
