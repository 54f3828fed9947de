//! SQLite transactions.
//!
//! A [`SqliteTransaction`] owns the adapter's write lock from the moment the
//! engine transaction is opened until it is committed, rolled back, or
//! dropped. Completion issues `COMMIT` / `ROLLBACK` itself unless the
//! transaction runs in phantom query mode, in which case the caller has
//! already sent the statement and completion only releases the lock.

use async_trait::async_trait;
use tracing::{debug, warn};

use prax_driver::{
    AdapterResult, DriverError, Queryable, ResultSet, SqlQuery, Transaction, TransactionOptions,
};

use crate::mutex::WriteGuard;
use crate::queryable::SqliteQueryable;

/// An open SQLite transaction.
pub struct SqliteTransaction {
    queryable: SqliteQueryable,
    guard: Option<WriteGuard>,
    options: TransactionOptions,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("guard", &self.guard)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SqliteTransaction {
    pub(crate) fn new(
        queryable: SqliteQueryable,
        guard: WriteGuard,
        options: TransactionOptions,
    ) -> Self {
        Self {
            queryable,
            guard: Some(guard),
            options,
        }
    }

    /// Whether the transaction has not been completed yet.
    pub fn is_open(&self) -> bool {
        self.guard.is_some()
    }

    fn ensure_open(&self, operation: &str) -> AdapterResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DriverError::transaction_closed(format!(
                "cannot {} after the transaction completed",
                operation
            ))
            .into())
        }
    }

    async fn complete(&mut self, statement: &'static str) -> AdapterResult<()> {
        let Some(mut guard) = self.guard.take() else {
            return Err(DriverError::transaction_closed(format!(
                "cannot {} a completed transaction",
                statement.to_lowercase()
            ))
            .into());
        };

        let result = if self.options.use_phantom_query {
            debug!(statement, "Releasing transaction lock");
            Ok(())
        } else {
            debug!(statement, "Completing transaction");
            self.queryable.execute_statement(statement).await
        };

        if result.is_err() && statement == "COMMIT" {
            // A failed COMMIT can leave the engine transaction open.
            if let Ok(false) = self.queryable.is_autocommit().await {
                if let Err(e) = self.queryable.execute_statement("ROLLBACK").await {
                    warn!(error = %e, "Rollback after failed commit failed");
                }
            }
        }

        guard.release();
        result
    }
}

#[async_trait]
impl Queryable for SqliteTransaction {
    fn provider(&self) -> &'static str {
        self.queryable.provider()
    }

    fn adapter_name(&self) -> &'static str {
        self.queryable.adapter_name()
    }

    async fn query_raw(&self, query: SqlQuery) -> AdapterResult<ResultSet> {
        self.ensure_open("query")?;
        self.queryable.query_raw(query).await
    }

    async fn execute_raw(&self, query: SqlQuery) -> AdapterResult<u64> {
        self.ensure_open("execute")?;
        self.queryable.execute_raw(query).await
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    fn options(&self) -> TransactionOptions {
        self.options
    }

    async fn commit(&mut self) -> AdapterResult<()> {
        self.complete("COMMIT").await
    }

    async fn rollback(&mut self) -> AdapterResult<()> {
        self.complete("ROLLBACK").await
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        warn!("Transaction dropped without commit or rollback, rolling back");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let queryable = self.queryable.clone();
                handle.spawn(async move {
                    if let Err(e) = queryable.execute_statement("ROLLBACK").await {
                        warn!(error = %e, "Rollback of dropped transaction failed");
                    }
                    drop(guard);
                });
            }
            Err(_) => {
                warn!("No runtime available, releasing the write lock without rollback");
                drop(guard);
            }
        }
    }
}
