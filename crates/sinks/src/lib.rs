//! loghook - Sinks
//!
//! Structured-log sinks that persist application log entries into
//! ClickHouse without blocking the code that logs them.
//!
//! # Architecture
//!
//! ```text
//! tracing::info!(..) --> [HookLayer] --Entry--> [Hook::deliver] --> [insert task] --> ClickHouse
//! ```
//!
//! A [`Hook`] receives one [`Entry`] at a time on the caller's thread.
//! [`ClickHouseHook`] maps it onto the declared columns of its table and
//! inserts the row from an independent task; failures there are reported
//! through `tracing` and never reach the caller.
//!
//! # Example
//!
//! ```ignore
//! use loghook_sinks::clickhouse::{ClickHouseConfig, ClickHouseHook, TableDescription};
//! use loghook_sinks::{Entry, Level};
//!
//! let table = TableDescription::new("events", "MergeTree")
//!     .column("id", "UInt32")
//!     .column("tag", "String")
//!     .primary_keys(["id"])
//!     .order_keys(["id", "tag"]);
//!
//! let hook = ClickHouseHook::connect(&ClickHouseConfig::default(), table).await?;
//! hook.deliver(&Entry::new(Level::Info, "hello").with_field("id", 7));
//! hook.flush().await;
//! ```

// =============================================================================
// Sink implementations
// =============================================================================

/// ClickHouse sink - schema provisioning and fire-and-forget inserts
pub mod clickhouse;

// =============================================================================
// Façade boundary
// =============================================================================

/// Log entry model
mod entry;

/// Hook trait implemented by sinks
mod hook;

/// `tracing_subscriber` layer forwarding events to a hook
pub mod layer;

// =============================================================================
// Public re-exports
// =============================================================================

pub use clickhouse::ClickHouseHook;
pub use entry::{Entry, Level, ParseLevelError};
pub use hook::Hook;
pub use layer::HookLayer;
