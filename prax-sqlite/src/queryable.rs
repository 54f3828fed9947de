//! Statement execution shared by adapters and transactions.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::Value;
use tokio_rusqlite::Connection;
use tracing::{debug, instrument, trace};

use prax_driver::{AdapterResult, Queryable, ResultSet, SqlQuery};

use crate::columns::{declared_columns, extract_tables, fill_declared_types, resolve_column_types};
use crate::config::SqliteConfig;
use crate::error::convert_error;
use crate::types::{decode_row, encode_arguments};

/// The provider name reported by SQLite adapters.
pub const PROVIDER: &str = "sqlite";

/// The adapter name reported by SQLite adapters.
pub const ADAPTER_NAME: &str = "prax-sqlite";

/// Runs statements against one engine connection.
#[derive(Clone)]
pub struct SqliteQueryable {
    conn: Connection,
    config: Arc<SqliteConfig>,
}

impl SqliteQueryable {
    pub(crate) fn new(conn: Connection, config: Arc<SqliteConfig>) -> Self {
        Self { conn, config }
    }

    /// Get the engine connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get the configuration this connection was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Run a fixed statement without arguments.
    pub(crate) async fn execute_statement(&self, sql: &'static str) -> AdapterResult<()> {
        trace!(sql = %sql, "Executing statement");
        self.conn
            .call(move |conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .await
            .map_err(convert_error)
    }

    /// Run a multi-statement script.
    pub(crate) async fn execute_batch(&self, script: &str) -> AdapterResult<()> {
        let script = script.to_string();
        debug!(len = script.len(), "Executing script");
        self.conn
            .call(move |conn| {
                conn.execute_batch(&script)?;
                Ok(())
            })
            .await
            .map_err(convert_error)
    }

    /// Whether the connection is outside any transaction.
    pub(crate) async fn is_autocommit(&self) -> AdapterResult<bool> {
        self.conn
            .call(|conn| Ok(conn.is_autocommit()))
            .await
            .map_err(convert_error)
    }
}

#[async_trait]
impl Queryable for SqliteQueryable {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn adapter_name(&self) -> &'static str {
        ADAPTER_NAME
    }

    #[instrument(skip(self, query), fields(sql = %query.sql))]
    async fn query_raw(&self, query: SqlQuery) -> AdapterResult<ResultSet> {
        debug!(args = query.args.len(), "Executing query");
        let params = encode_arguments(&query, self.config.timestamp_format)?;
        let safe_integers = self.config.safe_integers;
        let sql = query.sql;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let column_names: Vec<String> =
                    stmt.column_names().iter().map(|s| s.to_string()).collect();
                let positional: Vec<Option<String>> = stmt
                    .columns()
                    .iter()
                    .map(|column| column.decl_type().map(str::to_string))
                    .collect();

                let params_ref: Vec<&dyn rusqlite::ToSql> =
                    params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

                if column_names.is_empty() {
                    stmt.execute(params_ref.as_slice())?;
                    return Ok(ResultSet {
                        last_insert_id: Some(conn.last_insert_rowid().to_string()),
                        ..ResultSet::default()
                    });
                }

                let mut raw_rows: Vec<Vec<Value>> = Vec::new();
                let mut rows = stmt.query(params_ref.as_slice())?;
                while let Some(row) = rows.next()? {
                    let values = (0..column_names.len())
                        .map(|i| row.get::<_, Value>(i))
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    raw_rows.push(values);
                }
                drop(rows);
                drop(stmt);

                let declared_types = if positional.iter().any(Option::is_none) {
                    let declared = declared_columns(conn, &extract_tables(&sql));
                    fill_declared_types(positional, &column_names, &declared)
                } else {
                    positional
                };
                let column_types =
                    resolve_column_types(&declared_types, &raw_rows, safe_integers);

                let rows = raw_rows
                    .into_iter()
                    .map(|row| decode_row(row, &column_types, safe_integers))
                    .collect();

                Ok(ResultSet {
                    column_names,
                    column_types,
                    rows,
                    last_insert_id: None,
                })
            })
            .await
            .map_err(convert_error)
    }

    #[instrument(skip(self, query), fields(sql = %query.sql))]
    async fn execute_raw(&self, query: SqlQuery) -> AdapterResult<u64> {
        debug!(args = query.args.len(), "Executing statement");
        let params = encode_arguments(&query, self.config.timestamp_format)?;
        let sql = query.sql;

        self.conn
            .call(move |conn| {
                let params_ref: Vec<&dyn rusqlite::ToSql> =
                    params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

                let mut stmt = conn.prepare(&sql)?;
                let readonly = stmt.readonly();
                // Rows from RETURNING or a SELECT are stepped through and discarded.
                let mut rows = stmt.query(params_ref.as_slice())?;
                while rows.next()?.is_some() {}
                drop(rows);
                drop(stmt);

                Ok(if readonly { 0 } else { conn.changes() as u64 })
            })
            .await
            .map_err(convert_error)
    }
}
