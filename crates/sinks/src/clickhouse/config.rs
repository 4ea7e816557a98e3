//! ClickHouse hook configuration
//!
//! Connection settings and the ambient deadline applied to every statement.

use std::collections::BTreeMap;
use std::time::Duration;

use clickhouse::Client;

// =============================================================================
// Constants
// =============================================================================

/// Default ClickHouse HTTP URL
pub const DEFAULT_URL: &str = "http://localhost:8123";

/// Default time allowed for the startup connectivity check
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the ClickHouse hook connection
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123")
    pub url: String,

    /// Database name
    pub database: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Connection timeout for the startup ping
    pub connection_timeout: Duration,

    /// Per-statement deadline (None = no deadline)
    pub statement_timeout: Option<Duration>,

    /// Server settings sent with every query
    pub settings: BTreeMap<String, String>,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            database: "default".into(),
            username: None,
            password: None,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            statement_timeout: None,
            settings: BTreeMap::new(),
        }
    }
}

impl ClickHouseConfig {
    /// Set the ClickHouse URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the startup connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the per-statement deadline
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Add a server setting (e.g. `max_execution_time`)
    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(name.into(), value.into());
        self
    }

    /// Build the ClickHouse client from this config
    pub fn build_client(&self) -> Client {
        let mut client = Client::default()
            .with_url(&self.url)
            .with_database(&self.database);

        if let Some(ref username) = self.username {
            client = client.with_user(username);
        }

        if let Some(ref password) = self.password {
            client = client.with_password(password);
        }

        for (name, value) in &self.settings {
            client = client.with_option(name, value);
        }

        client
    }
}
