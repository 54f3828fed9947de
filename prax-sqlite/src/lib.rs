//! SQLite driver adapter for Prax.
//!
//! This crate implements the `prax-driver` adapter protocol on top of
//! `tokio-rusqlite`. It turns wire-level arguments into engine values,
//! types result columns from the declared schema, classifies engine
//! failures, and serializes write transactions through a FIFO lock.
//!
//! # Features
//!
//! - Async/await support via `tokio-rusqlite`
//! - Integer-safe decoding (64-bit integers leave as decimal strings)
//! - Declared-type column resolution with value-based fallback
//! - Classified constraint, schema and timeout errors
//! - One write transaction at a time, queued in arrival order
//! - Optional WAL journaling and an isolated shadow database
//!
//! # Example
//!
//! ```rust,no_run
//! use prax_driver::{Queryable, ScalarType, SqlDriverAdapter, SqlDriverAdapterFactory, SqlQuery, Transaction};
//! use prax_sqlite::{SqliteAdapterFactory, SqliteConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = SqliteAdapterFactory::new(SqliteConfig::from_url("sqlite://./mydb.db")?);
//!     let adapter = factory.connect().await?;
//!
//!     adapter.execute_script("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)").await?;
//!
//!     let mut tx = adapter.start_transaction(None).await?;
//!     tx.execute_raw(SqlQuery::new("INSERT INTO users (name) VALUES (?)").bind("Alice", ScalarType::Text))
//!         .await?;
//!     tx.commit().await?;
//!
//!     let users = adapter.query_raw(SqlQuery::new("SELECT id, name FROM users")).await?;
//!     println!("{:?}", users.rows);
//!
//!     adapter.dispose().await?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod columns;
pub mod config;
pub mod error;
pub mod factory;
pub mod mutex;
pub mod queryable;
pub mod transaction;
pub mod types;

pub use adapter::{MAX_BIND_VALUES, SqliteAdapter};
pub use config::{DatabasePath, SqliteConfig, SynchronousMode, TimestampFormat, WalConfig};
pub use error::{NativeError, classify, convert_error};
pub use factory::SqliteAdapterFactory;
pub use mutex::{WriteGuard, WriteLock};
pub use queryable::{ADAPTER_NAME, PROVIDER, SqliteQueryable};
pub use transaction::SqliteTransaction;
