//! End-to-end tests for transactions and the write lock.

use std::sync::Arc;
use std::time::Duration;

use prax_driver_adapters::prelude::*;
use pretty_assertions::assert_eq;

async fn adapter_with_log(config: SqliteConfig) -> SqliteAdapter {
    let adapter = SqliteAdapterFactory::new(config).connect().await.unwrap();
    adapter
        .execute_script("CREATE TABLE log (entry INTEGER);")
        .await
        .unwrap();
    adapter
}

fn insert(entry: i32) -> SqlQuery {
    SqlQuery::new("INSERT INTO log (entry) VALUES (?)").bind(entry, ScalarType::Int32)
}

async fn entries(adapter: &SqliteAdapter) -> Vec<i64> {
    adapter
        .query_raw(SqlQuery::new("SELECT entry FROM log ORDER BY rowid"))
        .await
        .unwrap()
        .rows
        .iter()
        .filter_map(|row| row[0].as_i64())
        .collect()
}

async fn wait_for_queue(adapter: &SqliteAdapter, len: usize) {
    while adapter.write_lock().queued() < len {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_commit_and_rollback() {
    let adapter = adapter_with_log(SqliteConfig::memory()).await;

    let mut tx = adapter.start_transaction(None).await.unwrap();
    tx.execute_raw(insert(1)).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = adapter.start_transaction(None).await.unwrap();
    tx.execute_raw(insert(2)).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(entries(&adapter).await, vec![1]);
    assert!(!adapter.write_lock().is_locked());
}

#[tokio::test]
async fn test_completed_transaction_rejects_further_use() {
    let adapter = adapter_with_log(SqliteConfig::memory()).await;

    let mut tx = adapter.start_transaction(None).await.unwrap();
    tx.commit().await.unwrap();

    let err = tx.commit().await.unwrap_err();
    assert!(matches!(
        err.kind(),
        Some(DriverErrorKind::TransactionAlreadyClosed { .. })
    ));
    assert!(tx.execute_raw(insert(1)).await.is_err());
}

#[tokio::test]
async fn test_queued_transactions_run_in_arrival_order() {
    let adapter = Arc::new(adapter_with_log(SqliteConfig::memory()).await);

    let mut first = adapter.start_transaction(None).await.unwrap();

    let mut handles = Vec::new();
    for entry in 1..=4 {
        let task_adapter = Arc::clone(&adapter);
        handles.push(tokio::spawn(async move {
            let mut tx = task_adapter.start_transaction(None).await?;
            tx.execute_raw(insert(entry)).await?;
            tx.commit().await
        }));
        wait_for_queue(&adapter, entry as usize).await;
    }

    first.execute_raw(insert(0)).await.unwrap();
    first.commit().await.unwrap();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(entries(&adapter).await, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_unsupported_isolation_level_fails_before_locking() {
    let adapter = adapter_with_log(SqliteConfig::memory()).await;

    let err = adapter
        .start_transaction(Some(IsolationLevel::ReadCommitted))
        .await
        .unwrap_err();

    assert_eq!(
        err.kind(),
        Some(&DriverErrorKind::InvalidIsolationLevel {
            level: "READ COMMITTED".to_string()
        })
    );
    assert!(!adapter.write_lock().is_locked());

    let mut tx = adapter
        .start_transaction(Some(IsolationLevel::Serializable))
        .await
        .unwrap();
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_dispose_waits_for_open_transaction() {
    let adapter = Arc::new(adapter_with_log(SqliteConfig::memory()).await);
    let mut tx = adapter.start_transaction(None).await.unwrap();

    let disposer = {
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { adapter.dispose().await })
    };
    wait_for_queue(&adapter, 1).await;
    assert!(!disposer.is_finished());

    tx.execute_raw(insert(1)).await.unwrap();
    tx.commit().await.unwrap();

    disposer.await.unwrap().unwrap();
    assert!(adapter.query_raw(SqlQuery::new("SELECT 1")).await.is_err());
    adapter.dispose().await.unwrap();
}

#[tokio::test]
async fn test_phantom_mode_leaves_statements_to_caller() {
    let adapter = adapter_with_log(SqliteConfig::memory().phantom_query(true)).await;

    let mut tx = adapter.start_transaction(None).await.unwrap();
    assert!(tx.options().use_phantom_query);
    tx.execute_raw(insert(1)).await.unwrap();
    tx.commit().await.unwrap();

    assert!(!adapter.write_lock().is_locked());

    // The engine transaction stays open until the caller ends it.
    adapter.execute_raw(SqlQuery::new("ROLLBACK")).await.unwrap();
    assert_eq!(entries(&adapter).await, Vec::<i64>::new());
}

#[tokio::test]
async fn test_dropped_transaction_is_rolled_back() {
    let adapter = adapter_with_log(SqliteConfig::memory()).await;

    {
        let tx = adapter.start_transaction(None).await.unwrap();
        tx.execute_raw(insert(1)).await.unwrap();
    }

    // The next writer only gets the lock once the rollback has been sent.
    let mut tx = adapter.start_transaction(None).await.unwrap();
    tx.execute_raw(insert(2)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(entries(&adapter).await, vec![2]);
}
