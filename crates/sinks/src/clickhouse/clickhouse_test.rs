//! Tests for the ClickHouse hook

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::entry::{Entry, Level};
use crate::hook::Hook;

use super::config::ClickHouseConfig;
use super::error::{ConstructionError, StoreError, ValidationError};
use super::sink::ClickHouseHook;
use super::store::Statement;
use super::test_support::{MemoryStore, events_table};

async fn events_hook(store: &Arc<MemoryStore>) -> ClickHouseHook {
    ClickHouseHook::with_connection(store.connection(), events_table())
        .await
        .unwrap()
}

fn tagged(id: u32, tag: &str) -> Entry {
    Entry::new(Level::Info, format!("entry {id}"))
        .with_field("id", id)
        .with_field("tag", tag)
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_construction_creates_table() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;

    assert_eq!(hook.table().name, "events");
    let statements = store.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].sql().starts_with("CREATE TABLE IF NOT EXISTS events"));
}

#[tokio::test]
async fn test_invalid_description_never_touches_store() {
    let store = MemoryStore::new();
    let table = events_table().order_keys(Vec::<String>::new());

    let err = ClickHouseHook::with_connection(store.connection(), table)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConstructionError::Validation(ValidationError::NoOrderKeys)
    ));
    assert!(err.to_string().contains("table order by keys are not defined"));
    assert!(store.statements().is_empty());
}

#[tokio::test]
async fn test_validation_runs_before_connecting() {
    // Unroutable URL: reaching the connect step would fail differently
    let config = ClickHouseConfig::default()
        .with_url("http://127.0.0.1:1")
        .with_connection_timeout(Duration::from_millis(200));
    let table = events_table().primary_keys(["missing"]);

    let err = ClickHouseHook::connect(&config, table).await.unwrap_err();
    assert!(matches!(
        err,
        ConstructionError::Validation(ValidationError::UnknownPrimaryKey(ref key)) if key == "missing"
    ));
}

#[tokio::test]
async fn test_unreachable_server_fails_construction() {
    let config = ClickHouseConfig::default()
        .with_url("http://127.0.0.1:1")
        .with_connection_timeout(Duration::from_millis(500));

    let err = ClickHouseHook::connect(&config, events_table())
        .await
        .unwrap_err();
    match err {
        ConstructionError::Connect { url, .. } => assert_eq!(url, "http://127.0.0.1:1"),
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_schema_failure_fails_construction() {
    let store = MemoryStore::new();
    store.set_available(false);

    let err = ClickHouseHook::with_connection(store.connection(), events_table())
        .await
        .unwrap_err();
    match err {
        ConstructionError::Schema { table, source } => {
            assert_eq!(table, "events");
            assert!(matches!(source, StoreError::Other(_)));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_statement_timeout_bounds_schema_creation() {
    let store = MemoryStore::with_delay(Duration::from_secs(10));
    let conn = store
        .connection()
        .with_statement_timeout(Some(Duration::from_secs(1)));

    let err = ClickHouseHook::with_connection(conn, events_table())
        .await
        .unwrap_err();
    match err {
        ConstructionError::Schema {
            source: StoreError::Timeout(limit),
            ..
        } => assert_eq!(limit, Duration::from_secs(1)),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(store.statements().is_empty());
}

// =============================================================================
// Delivery
// =============================================================================

#[tokio::test]
async fn test_deliver_inserts_declared_columns() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;

    let entry = Entry::new(Level::Info, "hello")
        .with_field("id", 7)
        .with_field("tag", "x")
        .with_field("extra", "dropped");
    hook.deliver(&entry);
    hook.flush().await;

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(
        inserts[0].sql(),
        "INSERT INTO `events` (id, level, message, tag, time) VALUES (?, ?, ?, ?, ?)"
    );
    let params = inserts[0].params();
    assert_eq!(&params[..4], ["7", "info", "hello", "x"]);
    assert!(!params.iter().any(|p| p == "dropped"));

    let metrics = hook.metrics();
    assert_eq!(metrics.rows_delivered, 1);
    assert_eq!(metrics.rows_inserted, 1);
    assert_eq!(metrics.rows_lost(), 0);
}

#[tokio::test]
async fn test_store_outage_drops_rows_then_recovers() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;

    store.set_available(false);
    hook.deliver(&tagged(1, "lost"));
    hook.flush().await;

    assert!(store.inserts().is_empty());
    assert_eq!(hook.metrics().insert_errors, 1);

    store.set_available(true);
    hook.deliver(&tagged(2, "kept"));
    hook.flush().await;

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].params()[0], "2");

    let metrics = hook.metrics();
    assert_eq!(metrics.rows_inserted, 1);
    assert_eq!(metrics.insert_errors, 1);
    assert_eq!(metrics.in_flight(), 0);
}

#[tokio::test]
async fn test_panicking_insert_is_contained() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;

    store.set_panic_on_insert(true);
    hook.deliver(&tagged(1, "boom"));
    hook.flush().await;

    assert_eq!(hook.metrics().insert_faults, 1);

    store.set_panic_on_insert(false);
    hook.deliver(&tagged(2, "fine"));
    hook.flush().await;

    assert_eq!(store.inserts().len(), 1);
    assert_eq!(hook.metrics().rows_inserted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_from_plain_threads() {
    let store = MemoryStore::new();
    let hook = Arc::new(events_hook(&store).await);

    std::thread::scope(|scope| {
        for worker in 0..8u32 {
            let hook = Arc::clone(&hook);
            scope.spawn(move || {
                for i in 0..25u32 {
                    hook.deliver(&tagged(worker * 25 + i, &format!("worker-{worker}")));
                }
            });
        }
    });
    hook.flush().await;

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 200);

    let ids: BTreeSet<u32> = inserts
        .iter()
        .map(|s| s.params()[0].parse().unwrap())
        .collect();
    assert_eq!(ids, (0..200).collect());

    // Each row carries its own message and tag
    for insert in &inserts {
        let params = insert.params();
        let id: u32 = params[0].parse().unwrap();
        assert_eq!(params[2], format!("entry {id}"));
        assert_eq!(params[3], format!("worker-{}", id / 25));
    }

    assert_eq!(hook.metrics().rows_inserted, 200);
}

#[tokio::test(start_paused = true)]
async fn test_deliver_returns_before_insert_completes() {
    let store = MemoryStore::with_delay(Duration::from_secs(5));
    let hook = events_hook(&store).await;

    hook.deliver(&tagged(1, "slow"));
    assert!(store.inserts().is_empty());
    assert_eq!(hook.metrics().in_flight(), 1);

    hook.flush().await;
    assert_eq!(store.inserts().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_flush_is_not_held_open_by_later_deliveries() {
    let store = MemoryStore::with_delay(Duration::from_millis(20));
    let hook = Arc::new(events_hook(&store).await);

    hook.deliver(&tagged(0, "before-flush"));

    let stop = Arc::new(AtomicBool::new(false));
    let producer = {
        let hook = Arc::clone(&hook);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut id = 1;
            while !stop.load(Ordering::SeqCst) {
                hook.deliver(&tagged(id, "steady"));
                id += 1;
                std::thread::sleep(Duration::from_millis(5));
            }
        })
    };
    // Let the producer get going before flushing
    tokio::time::sleep(Duration::from_millis(15)).await;

    let flushed = tokio::time::timeout(Duration::from_secs(3), hook.flush()).await;

    stop.store(true, Ordering::SeqCst);
    producer.join().unwrap();

    assert!(flushed.is_ok(), "flush waited on entries delivered after it");
    assert!(store.inserts().iter().any(|s| s.params()[0] == "0"));

    hook.flush().await;
    assert_eq!(hook.metrics().in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_completes_under_steady_load() {
    let store = MemoryStore::with_delay(Duration::from_millis(20));
    let hook = Arc::new(events_hook(&store).await);

    let stop = Arc::new(AtomicBool::new(false));
    let producer = {
        let hook = Arc::clone(&hook);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut id = 0;
            while !stop.load(Ordering::SeqCst) {
                hook.deliver(&tagged(id, "steady"));
                id += 1;
                std::thread::sleep(Duration::from_millis(5));
            }
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let snapshot = tokio::time::timeout(Duration::from_secs(3), hook.shutdown()).await;

    stop.store(true, Ordering::SeqCst);
    producer.join().unwrap();

    let snapshot = snapshot.expect("shutdown waited on entries delivered after it");
    assert!(snapshot.rows_delivered > 0);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_in_flight_inserts() {
    let store = MemoryStore::with_delay(Duration::from_secs(60));
    let hook = events_hook(&store).await;

    for id in 0..3 {
        hook.deliver(&tagged(id, "pending"));
    }
    let snapshot = hook.shutdown().await;

    assert!(store.inserts().is_empty());
    assert_eq!(snapshot.rows_delivered, 3);
    assert_eq!(snapshot.rows_inserted, 0);
    assert_eq!(snapshot.insert_errors, 3);

    // Still accepted, immediately dropped
    hook.deliver(&tagged(9, "late"));
    hook.flush().await;
    assert_eq!(hook.metrics().insert_errors, 4);
}

#[tokio::test]
async fn test_cancelled_connection_rejects_statements() {
    let store = MemoryStore::new();
    let conn = store.connection();
    conn.cancel();

    let err = conn.execute(&Statement::new("SELECT 1")).await.unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
    assert!(store.statements().is_empty());
}

// =============================================================================
// Table maintenance and hook surface
// =============================================================================

#[tokio::test]
async fn test_clear_table_drops_table() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;

    hook.clear_table().await.unwrap();

    let statements = store.statements();
    assert_eq!(
        statements.last().map(|s| s.sql()),
        Some("DROP TABLE IF EXISTS events;")
    );
}

#[tokio::test]
async fn test_hook_accepts_every_level() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;

    assert_eq!(Hook::levels(&hook), &Level::ALL);
    for level in Level::ALL {
        assert!(hook.accepts(level));
    }
}

#[tokio::test]
async fn test_debug_output_names_table() {
    let store = MemoryStore::new();
    let hook = events_hook(&store).await;
    assert!(format!("{hook:?}").contains("events"));
}
