//! The driver adapter protocol.
//!
//! A driver implements these traits so the query engine can run statements
//! without knowing anything about the engine underneath:
//!
//! - [`Queryable`]: run a statement, read rows or an affected-row count
//! - [`Transaction`]: a queryable bound to an open engine transaction
//! - [`SqlDriverAdapter`]: scripts, transactions and teardown
//! - [`SqlDriverAdapterFactory`]: builds adapters from configuration
//!
//! ```rust,ignore
//! let adapter = factory.connect().await?;
//!
//! let mut tx = adapter.start_transaction(None).await?;
//! tx.execute_raw(SqlQuery::new("INSERT INTO users (name) VALUES (?)")
//!     .bind("Alice", ScalarType::Text)).await?;
//! tx.commit().await?;
//!
//! adapter.dispose().await?;
//! ```

use async_trait::async_trait;

use crate::error::AdapterResult;
use crate::transaction::{IsolationLevel, TransactionOptions};
use crate::types::{ConnectionInfo, ResultSet, SqlQuery};

/// Something statements can be run against.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// The database provider (e.g., "sqlite").
    fn provider(&self) -> &'static str;

    /// The adapter implementation name.
    fn adapter_name(&self) -> &'static str;

    /// Run a statement and return its rows.
    async fn query_raw(&self, query: SqlQuery) -> AdapterResult<ResultSet>;

    /// Run a statement and return the number of affected rows.
    async fn execute_raw(&self, query: SqlQuery) -> AdapterResult<u64>;
}

/// A queryable scoped to an open engine transaction.
///
/// Completing the transaction releases the adapter's write lock. Whether
/// `commit` / `rollback` also send `COMMIT` / `ROLLBACK` to the engine is
/// decided by [`TransactionOptions::use_phantom_query`].
#[async_trait]
pub trait Transaction: Queryable {
    /// The options this transaction was opened with.
    fn options(&self) -> TransactionOptions;

    /// Commit and release the write lock.
    async fn commit(&mut self) -> AdapterResult<()>;

    /// Roll back and release the write lock.
    async fn rollback(&mut self) -> AdapterResult<()>;
}

/// A connected driver adapter.
#[async_trait]
pub trait SqlDriverAdapter: Queryable {
    /// The transaction type handed out by this adapter.
    type Transaction: Transaction;

    /// Run a multi-statement script.
    async fn execute_script(&self, script: &str) -> AdapterResult<()>;

    /// Open a write transaction, waiting for any in-flight one to finish.
    async fn start_transaction(
        &self,
        isolation_level: Option<IsolationLevel>,
    ) -> AdapterResult<Self::Transaction>;

    /// Static information about the connection.
    fn connection_info(&self) -> ConnectionInfo;

    /// Close the connection once no transaction is in flight.
    async fn dispose(&self) -> AdapterResult<()>;
}

/// Builds adapters.
#[async_trait]
pub trait SqlDriverAdapterFactory: Send + Sync {
    /// The adapter type this factory builds.
    type Adapter: SqlDriverAdapter;

    /// The database provider (e.g., "sqlite").
    fn provider(&self) -> &'static str;

    /// Connect to the primary database.
    async fn connect(&self) -> AdapterResult<Self::Adapter>;
}

/// A factory that can also open an isolated shadow database for trial
/// migration runs.
#[async_trait]
pub trait SqlMigrationAwareDriverAdapterFactory: SqlDriverAdapterFactory {
    /// Connect to the shadow database.
    async fn connect_to_shadow_db(&self) -> AdapterResult<Self::Adapter>;
}
