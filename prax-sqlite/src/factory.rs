//! Adapter factory.
//!
//! ```rust,no_run
//! use prax_driver::{SqlDriverAdapter, SqlDriverAdapterFactory};
//! use prax_sqlite::{SqliteAdapterFactory, SqliteConfig, WalConfig};
//!
//! # async fn example() -> prax_driver::AdapterResult<()> {
//! let factory = SqliteAdapterFactory::new(SqliteConfig::file("app.db").wal(WalConfig::enabled()));
//! let adapter = factory.connect().await?;
//! adapter.dispose().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use prax_driver::{
    AdapterResult, DriverError, SqlDriverAdapterFactory, SqlMigrationAwareDriverAdapterFactory,
};

use crate::adapter::SqliteAdapter;
use crate::config::{DatabasePath, SqliteConfig};
use crate::error::convert_error;
use crate::queryable::PROVIDER;

/// Builds SQLite adapters for a primary and a shadow database.
#[derive(Debug, Clone)]
pub struct SqliteAdapterFactory {
    config: Arc<SqliteConfig>,
}

impl SqliteAdapterFactory {
    /// Create a factory from configuration.
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create a factory from a SQLite URL.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, DriverError> {
        SqliteConfig::from_url(url).map(Self::new)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    async fn open(&self, path: &DatabasePath) -> AdapterResult<SqliteAdapter> {
        let conn = match path {
            DatabasePath::Memory => Connection::open_in_memory().await,
            DatabasePath::File(file) => Connection::open(file).await,
        }
        .map_err(convert_error)?;

        self.configure(&conn, path).await?;

        info!(path = %path.as_str(), "SQLite connection established");
        Ok(SqliteAdapter::new(conn, Arc::clone(&self.config)))
    }

    async fn configure(&self, conn: &Connection, path: &DatabasePath) -> AdapterResult<()> {
        let foreign_keys = self.config.foreign_keys;
        let wal = self.config.applies_wal(path);

        let journal_mode = conn
            .call(move |conn| {
                if foreign_keys {
                    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                }
                if !wal {
                    return Ok(None);
                }
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                Ok(Some(mode))
            })
            .await
            .map_err(convert_error)?;

        if let Some(mode) = &journal_mode {
            if !mode.eq_ignore_ascii_case("wal") {
                return Err(DriverError::configuration(format!(
                    "journal mode WAL was not applied (engine reports '{}')",
                    mode
                ))
                .into());
            }
        }

        let init_sql = self.config.init_sql(journal_mode.is_some());
        debug!(wal, sql = %init_sql, "Applying connection pragmas");
        conn.call(move |conn| {
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await
        .map_err(convert_error)
    }
}

#[async_trait]
impl SqlDriverAdapterFactory for SqliteAdapterFactory {
    type Adapter = SqliteAdapter;

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn connect(&self) -> AdapterResult<SqliteAdapter> {
        self.open(&self.config.path).await
    }
}

#[async_trait]
impl SqlMigrationAwareDriverAdapterFactory for SqliteAdapterFactory {
    async fn connect_to_shadow_db(&self) -> AdapterResult<SqliteAdapter> {
        let shadow = self.config.shadow_path();
        debug!(path = %shadow.as_str(), "Opening shadow database");
        self.open(&shadow).await
    }
}
