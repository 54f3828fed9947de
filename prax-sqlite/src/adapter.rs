//! The SQLite driver adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use prax_driver::{
    AdapterError, AdapterResult, ConnectionInfo, DriverError, IsolationLevel, Queryable, ResultSet,
    SqlDriverAdapter, SqlQuery, TransactionOptions,
};

use crate::config::SqliteConfig;
use crate::error::convert_error;
use crate::mutex::{WriteGuard, WriteLock};
use crate::queryable::SqliteQueryable;
use crate::transaction::SqliteTransaction;

/// Maximum number of bind parameters per statement.
pub const MAX_BIND_VALUES: usize = 32766;

/// A connected SQLite adapter.
///
/// Reads run directly on the connection. Transactions, scripts and
/// disposal go through a FIFO write lock so only one write is in flight.
pub struct SqliteAdapter {
    queryable: SqliteQueryable,
    lock: WriteLock,
}

impl SqliteAdapter {
    pub(crate) fn new(conn: Connection, config: Arc<SqliteConfig>) -> Self {
        let lock = WriteLock::new(config.max_queued_writers);
        Self {
            queryable: SqliteQueryable::new(conn, config),
            lock,
        }
    }

    /// Get the configuration this adapter was opened with.
    pub fn config(&self) -> &SqliteConfig {
        self.queryable.config()
    }

    /// Get the write lock, for diagnostics.
    pub fn write_lock(&self) -> &WriteLock {
        &self.lock
    }
}

/// Undo a `BEGIN` whose transaction could not be handed out, then free the lock.
async fn abort_begin(
    queryable: &SqliteQueryable,
    mut guard: WriteGuard,
    failure: AdapterError,
) -> AdapterError {
    if let Err(e) = queryable.execute_statement("ROLLBACK").await {
        warn!(error = %e, "Compensating rollback failed");
    }
    guard.release();
    failure
}

#[async_trait]
impl Queryable for SqliteAdapter {
    fn provider(&self) -> &'static str {
        self.queryable.provider()
    }

    fn adapter_name(&self) -> &'static str {
        self.queryable.adapter_name()
    }

    async fn query_raw(&self, query: SqlQuery) -> AdapterResult<ResultSet> {
        self.queryable.query_raw(query).await
    }

    async fn execute_raw(&self, query: SqlQuery) -> AdapterResult<u64> {
        self.queryable.execute_raw(query).await
    }
}

#[async_trait]
impl SqlDriverAdapter for SqliteAdapter {
    type Transaction = SqliteTransaction;

    async fn execute_script(&self, script: &str) -> AdapterResult<()> {
        let _guard = self.lock.acquire().await?;
        self.queryable.execute_batch(script).await
    }

    #[instrument(skip(self))]
    async fn start_transaction(
        &self,
        isolation_level: Option<IsolationLevel>,
    ) -> AdapterResult<SqliteTransaction> {
        if let Some(level) = isolation_level {
            if level != IsolationLevel::Serializable {
                return Err(DriverError::invalid_isolation_level(level.as_sql()).into());
            }
        }

        let options = TransactionOptions::new().phantom_query(self.config().use_phantom_query);
        let guard = self.lock.acquire().await?;
        debug!(phantom = options.use_phantom_query, "Starting transaction");

        self.queryable.execute_statement("BEGIN").await?;

        let failure = match self.queryable.is_autocommit().await {
            Ok(false) => {
                return Ok(SqliteTransaction::new(self.queryable.clone(), guard, options));
            }
            Ok(true) => AdapterError::from(DriverError::transaction_closed(
                "engine did not open a transaction",
            )),
            Err(e) => e,
        };

        Err(abort_begin(&self.queryable, guard, failure).await)
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            max_bind_values: Some(MAX_BIND_VALUES),
            supports_relation_joins: false,
        }
    }

    async fn dispose(&self) -> AdapterResult<()> {
        let _guard = self.lock.acquire().await?;
        info!(path = %self.config().path_str(), "Closing SQLite connection");

        match self.queryable.connection().clone().close().await {
            Ok(()) | Err(tokio_rusqlite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(convert_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::SqliteAdapterFactory;
    use prax_driver::SqlDriverAdapterFactory;

    async fn adapter() -> SqliteAdapter {
        SqliteAdapterFactory::new(SqliteConfig::memory())
            .connect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_abort_begin_rolls_back_and_releases() {
        let adapter = adapter().await;
        let guard = adapter.lock.acquire().await.unwrap();
        adapter.queryable.execute_statement("BEGIN").await.unwrap();
        assert!(!adapter.queryable.is_autocommit().await.unwrap());

        let failure = AdapterError::from(DriverError::transaction_closed("hand-off failed"));
        let err = abort_begin(&adapter.queryable, guard, failure).await;

        assert!(matches!(
            err.kind(),
            Some(prax_driver::DriverErrorKind::TransactionAlreadyClosed { .. })
        ));
        assert!(adapter.queryable.is_autocommit().await.unwrap());
        assert!(!adapter.write_lock().is_locked());
    }

    #[tokio::test]
    async fn test_abort_begin_releases_when_rollback_fails() {
        let adapter = adapter().await;
        let guard = adapter.lock.acquire().await.unwrap();

        // No transaction is open, so the rollback itself fails.
        let failure = AdapterError::from(DriverError::configuration("setup failed"));
        abort_begin(&adapter.queryable, guard, failure).await;

        assert!(adapter.queryable.is_autocommit().await.unwrap());
        assert!(!adapter.write_lock().is_locked());
    }

    #[tokio::test]
    async fn test_start_transaction_holds_lock_until_commit() {
        let adapter = adapter().await;
        let mut tx = adapter.start_transaction(None).await.unwrap();
        assert!(adapter.write_lock().is_locked());
        assert!(!adapter.queryable.is_autocommit().await.unwrap());

        prax_driver::Transaction::commit(&mut tx).await.unwrap();
        assert!(!adapter.write_lock().is_locked());
        assert!(adapter.queryable.is_autocommit().await.unwrap());
    }
}
