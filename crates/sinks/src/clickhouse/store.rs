//! Store access
//!
//! [`Store`] is the narrow surface the hook needs from a database driver:
//! check connectivity and execute one statement. [`Connection`] wraps a
//! store with the single cancellation/deadline context that governs every
//! statement issued through it.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clickhouse::Client;
use tokio_util::sync::CancellationToken;

use super::config::ClickHouseConfig;
use super::error::StoreError;

// =============================================================================
// Statement
// =============================================================================

/// SQL text with `?` placeholders and their text parameters, in order
///
/// A statement without parameters is plain SQL: any `?` in it (e.g. a
/// column default of `'?'`) is literal text. With parameters, every `?`
/// binds the next one and a literal question mark is written `??`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<String>,
}

impl Statement {
    /// Statement without parameters
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter bound to the next `?` placeholder
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    /// SQL text with placeholders
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// Minimal database client used by the hook
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Verify the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Execute a statement that returns no rows
    async fn execute(&self, statement: &Statement) -> Result<(), StoreError>;
}

/// [`Store`] backed by the ClickHouse HTTP client
///
/// Parameters are substituted client-side by the driver, which quotes and
/// escapes each one as a string literal.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: Client,
}

impl ClickHouseStore {
    /// Wrap an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Store for ClickHouseStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client.query("SELECT 1").execute().await?;
        Ok(())
    }

    async fn execute(&self, statement: &Statement) -> Result<(), StoreError> {
        let mut query = self.client.query(&driver_sql(statement));
        for param in statement.params() {
            query = query.bind(param.as_str());
        }
        query.execute().await?;
        Ok(())
    }
}

/// SQL as the driver's builder expects it, where a bare `?` is a placeholder
fn driver_sql(statement: &Statement) -> Cow<'_, str> {
    if statement.params().is_empty() && statement.sql().contains('?') {
        Cow::Owned(statement.sql().replace('?', "??"))
    } else {
        Cow::Borrowed(statement.sql())
    }
}

// =============================================================================
// Connection
// =============================================================================

/// A store plus the ambient cancellation/deadline context
///
/// Cheap to clone; clones share the store and the cancellation token.
#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn Store>,
    cancel: CancellationToken,
    statement_timeout: Option<Duration>,
}

impl Connection {
    /// Wrap a store with a fresh cancellation token and no deadline
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cancel: CancellationToken::new(),
            statement_timeout: None,
        }
    }

    /// Set the per-statement deadline
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Build a ClickHouse client from `config` and check it answers within
    /// the connection timeout
    pub async fn open(config: &ClickHouseConfig) -> Result<Self, StoreError> {
        let store = ClickHouseStore::new(config.build_client());
        let conn = Self::new(Arc::new(store)).with_statement_timeout(config.statement_timeout);
        conn.ping(config.connection_timeout).await?;
        Ok(conn)
    }

    /// Check connectivity, bounded by `timeout`
    pub async fn ping(&self, timeout: Duration) -> Result<(), StoreError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            res = tokio::time::timeout(timeout, self.store.ping()) => {
                res.map_err(|_| StoreError::Timeout(timeout))?
            }
        }
    }

    /// Execute a statement under the connection's cancellation and deadline
    pub async fn execute(&self, statement: &Statement) -> Result<(), StoreError> {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let run = async {
            match self.statement_timeout {
                Some(limit) => tokio::time::timeout(limit, self.store.execute(statement))
                    .await
                    .map_err(|_| StoreError::Timeout(limit))?,
                None => self.store.execute(statement).await,
            }
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            res = run => res,
        }
    }

    /// Cancel every in-flight and future statement on this connection
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
