//! In-memory store and fixtures shared by the ClickHouse tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::error::StoreError;
use super::schema::TableDescription;
use super::store::{Connection, Statement, Store};

/// Store that records statements instead of sending them anywhere
pub(crate) struct MemoryStore {
    executed: Mutex<Vec<Statement>>,
    available: AtomicBool,
    panic_on_insert: AtomicBool,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            executed: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            panic_on_insert: AtomicBool::new(false),
            delay: None,
        })
    }

    /// Every statement waits `delay` before completing
    pub(crate) fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            executed: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            panic_on_insert: AtomicBool::new(false),
            delay: Some(delay),
        })
    }

    /// Simulate the server going away or coming back
    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make inserts panic inside the driver
    pub(crate) fn set_panic_on_insert(&self, panic: bool) {
        self.panic_on_insert.store(panic, Ordering::SeqCst);
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    pub(crate) fn inserts(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|s| s.sql().starts_with("INSERT"))
            .collect()
    }

    pub(crate) fn connection(self: &Arc<Self>) -> Connection {
        Connection::new(Arc::clone(self) as Arc<dyn Store>)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Other("connection refused".into()));
        }
        Ok(())
    }

    async fn execute(&self, statement: &Statement) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Other("connection refused".into()));
        }

        if statement.sql().starts_with("INSERT") && self.panic_on_insert.load(Ordering::SeqCst) {
            panic!("simulated driver panic");
        }

        self.executed.lock().unwrap().push(statement.clone());
        Ok(())
    }
}

/// `events` table: id UInt32, tag String; PK (id); ORDER BY (id, tag)
pub(crate) fn events_table() -> TableDescription {
    TableDescription::new("events", "MergeTree")
        .column("id", "UInt32")
        .column("tag", "String")
        .primary_keys(["id"])
        .order_keys(["id", "tag"])
}
