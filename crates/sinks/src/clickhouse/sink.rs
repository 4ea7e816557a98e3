//! ClickHouse hook implementation
//!
//! Accepts log entries on the caller's thread and writes each one to
//! ClickHouse from its own tokio task.
//!
//! ```text
//! [caller] --deliver(entry)--> build LogRow --spawn--> [insert unit] --> ClickHouse
//!                   returns immediately                     |
//!                                                 failure -> tracing::error!
//! ```

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tokio_util::task::TaskTracker;

use crate::entry::{Entry, Level};
use crate::hook::Hook;

use super::config::ClickHouseConfig;
use super::error::{ConstructionError, DeliveryFault, StoreError};
use super::metrics::{HookMetrics, MetricsSnapshot};
use super::row::LogRow;
use super::schema::{self, TableDescription};
use super::store::Connection;

// =============================================================================
// Insert unit
// =============================================================================

/// Everything one insert needs; owned by the task that runs it
struct InsertUnit {
    conn: Connection,
    table: Arc<TableDescription>,
    row: LogRow,
}

impl InsertUnit {
    async fn run(self) -> Result<(), DeliveryFault> {
        let statement = self.row.insert_statement(&self.table.name);
        self.conn.execute(&statement).await?;
        Ok(())
    }
}

/// Turn a failed join into a fault
fn join_fault(err: JoinError) -> DeliveryFault {
    if err.is_panic() {
        DeliveryFault::Panicked(panic_message(err.into_panic()))
    } else {
        DeliveryFault::Aborted
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// ClickHouse Hook
// =============================================================================

/// Log hook that persists entries into one ClickHouse table
///
/// Built once at startup; the destination table is created if missing.
/// `deliver` never blocks and never fails: each row is inserted by an
/// independent task, and insert failures are reported through `tracing`
/// and the hook's metrics only.
pub struct ClickHouseHook {
    /// Store handle plus cancellation/deadline context
    conn: Connection,

    /// Destination table
    table: Arc<TableDescription>,

    /// Runtime insert units are spawned on
    runtime: Handle,

    /// Insert units dispatched since the last drain; swapped out by
    /// `flush`/`shutdown` so they only wait for earlier units
    generation: RwLock<TaskTracker>,

    /// Serializes flush/shutdown
    drain_lock: Mutex<()>,

    /// Metrics (Arc for sharing with insert units)
    metrics: Arc<HookMetrics>,
}

impl fmt::Debug for ClickHouseHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHouseHook")
            .field("table", &self.table.name)
            .field("in_flight", &self.current_generation().len())
            .field("cancelled", &self.conn.is_cancelled())
            .finish()
    }
}

impl ClickHouseHook {
    /// Validate the table, connect to ClickHouse and create the table
    ///
    /// Must be called from within a tokio runtime; insert units run on it.
    ///
    /// # Errors
    ///
    /// Fails without producing a hook if the description is invalid,
    /// ClickHouse cannot be reached, or the table cannot be created.
    pub async fn connect(
        config: &ClickHouseConfig,
        table: TableDescription,
    ) -> Result<Self, ConstructionError> {
        schema::validate(&table)?;

        let conn = Connection::open(config)
            .await
            .map_err(|source| ConstructionError::Connect {
                url: config.url.clone(),
                source,
            })?;

        Self::init(conn, table).await
    }

    /// Build the hook on an already opened connection
    ///
    /// # Errors
    ///
    /// Fails if the description is invalid or the table cannot be created.
    pub async fn with_connection(
        conn: Connection,
        table: TableDescription,
    ) -> Result<Self, ConstructionError> {
        schema::validate(&table)?;
        Self::init(conn, table).await
    }

    async fn init(conn: Connection, table: TableDescription) -> Result<Self, ConstructionError> {
        schema::ensure_table(&conn, &table)
            .await
            .map_err(|source| ConstructionError::Schema {
                table: table.name.clone(),
                source,
            })?;

        tracing::info!(
            table = %table.name,
            columns = table.columns.len(),
            "clickhouse hook ready"
        );

        Ok(Self {
            conn,
            table: Arc::new(table),
            runtime: Handle::current(),
            generation: RwLock::new(TaskTracker::new()),
            drain_lock: Mutex::new(()),
            metrics: Arc::new(HookMetrics::new()),
        })
    }

    /// Destination table description
    pub fn table(&self) -> &TableDescription {
        &self.table
    }

    /// Get a snapshot of the hook's metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Map an entry to the row that would be inserted for it
    pub fn build_row(&self, entry: &Entry) -> LogRow {
        LogRow::from_entry(&self.table, entry)
    }

    /// Accept an entry and schedule its insert
    ///
    /// Returns as soon as the insert is scheduled. Safe to call from any
    /// thread, inside or outside the runtime.
    pub fn deliver(&self, entry: &Entry) {
        let row = self.build_row(entry);
        self.metrics.record_delivered();
        self.dispatch(row);
    }

    /// Spawn the insert unit for a row behind a failure boundary
    fn dispatch(&self, row: LogRow) {
        let insert = InsertUnit {
            conn: self.conn.clone(),
            table: Arc::clone(&self.table),
            row,
        };
        let table = Arc::clone(&self.table);
        let metrics = Arc::clone(&self.metrics);

        let unit = async move {
            // Inner task: a panic while inserting surfaces as a JoinError here
            let outcome = match tokio::spawn(insert.run()).await {
                Ok(result) => result,
                Err(err) => Err(join_fault(err)),
            };

            match outcome {
                Ok(()) => {
                    metrics.record_inserted();
                    tracing::trace!(table = %table.name, "inserted log row");
                }
                Err(fault) => {
                    match &fault {
                        DeliveryFault::Store(_) => metrics.record_error(),
                        DeliveryFault::Panicked(_) | DeliveryFault::Aborted => {
                            metrics.record_fault()
                        }
                    }
                    tracing::error!(
                        table = %table.name,
                        error = %fault,
                        "failed to send log row to clickhouse, row dropped"
                    );
                }
            }
        };

        // Tracked under the read lock so a concurrent drain either sees this
        // unit in the generation it waits on or leaves it to the next one
        let tracked = self
            .generation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .track_future(unit);
        self.runtime.spawn(tracked);
    }

    fn current_generation(&self) -> TaskTracker {
        self.generation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start a new generation and wait for every unit of the previous one
    async fn drain(&self) {
        let previous = {
            let mut generation = self
                .generation
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *generation, TaskTracker::new())
        };
        previous.close();
        previous.wait().await;
    }

    /// Drop the destination table
    ///
    /// # Errors
    ///
    /// Returns the store error if the statement fails.
    pub async fn clear_table(&self) -> Result<(), StoreError> {
        schema::drop_table(&self.conn, &self.table.name).await
    }

    /// Wait for every insert scheduled so far to finish
    ///
    /// New deliveries are still accepted while waiting and are not waited
    /// for, so a steady producer cannot hold `flush` open.
    pub async fn flush(&self) {
        let _guard = self.drain_lock.lock().await;
        self.drain().await;
    }

    /// Cancel in-flight and future inserts, then wait for all units to end
    ///
    /// Cancelled rows are dropped and counted as insert errors. Entries
    /// delivered afterwards are still accepted and immediately dropped.
    pub async fn shutdown(&self) -> MetricsSnapshot {
        let _guard = self.drain_lock.lock().await;
        self.conn.cancel();
        self.drain().await;

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            table = %self.table.name,
            delivered = snapshot.rows_delivered,
            inserted = snapshot.rows_inserted,
            errors = snapshot.insert_errors,
            faults = snapshot.insert_faults,
            "clickhouse hook shut down"
        );
        snapshot
    }
}

impl Hook for ClickHouseHook {
    fn levels(&self) -> &[Level] {
        &Level::ALL
    }

    fn deliver(&self, entry: &Entry) {
        ClickHouseHook::deliver(self, entry);
    }
}
