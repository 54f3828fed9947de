//! Applying migrations through a driver adapter.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use prax_driver::{Queryable, ScalarType, SqlDriverAdapter, SqlQuery, Transaction};

use crate::error::{MigrateResult, MigrationError};
use crate::history::{INIT_SQL, INSERT_SQL, MigrationRecord, SELECT_APPLIED_SQL};
use crate::migration::Migration;

/// Result of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationResult {
    /// Number of migrations applied.
    pub applied_count: usize,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
    /// Names of applied migrations, in order.
    pub applied_migrations: Vec<String>,
}

/// Applies migration scripts and tracks them in `_prax_migrations`.
///
/// The adapter only runs scripts; which ones were applied is recorded here,
/// one history row per migration, written in its own transaction.
pub struct Migrator<'a, A: SqlDriverAdapter> {
    adapter: &'a A,
}

impl<'a, A: SqlDriverAdapter> Migrator<'a, A> {
    /// Create a migrator over an adapter.
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Create the history table if it does not exist.
    pub async fn initialize(&self) -> MigrateResult<()> {
        self.adapter.execute_script(INIT_SQL).await?;
        Ok(())
    }

    /// Get all applied migrations, ordered by name.
    pub async fn applied(&self) -> MigrateResult<Vec<MigrationRecord>> {
        self.initialize().await?;
        let result = self.adapter.query_raw(SqlQuery::new(SELECT_APPLIED_SQL)).await?;
        result
            .rows
            .iter()
            .map(|row| MigrationRecord::from_row(row))
            .collect()
    }

    /// Get the migrations that still need to be applied.
    ///
    /// Fails if an already applied migration has changed since.
    pub async fn pending<'m>(
        &self,
        migrations: &'m [Migration],
    ) -> MigrateResult<Vec<&'m Migration>> {
        let applied: HashMap<String, String> = self
            .applied()
            .await?
            .into_iter()
            .map(|record| (record.name, record.checksum))
            .collect();

        let mut pending = Vec::new();
        for migration in migrations {
            match applied.get(&migration.name) {
                Some(checksum) if *checksum != migration.checksum => {
                    return Err(MigrationError::ChecksumMismatch {
                        name: migration.name.clone(),
                        expected: checksum.clone(),
                        actual: migration.checksum.clone(),
                    });
                }
                Some(_) => {}
                None => pending.push(migration),
            }
        }
        Ok(pending)
    }

    /// Apply every pending migration in order.
    pub async fn apply(&self, migrations: &[Migration]) -> MigrateResult<MigrationResult> {
        let start = Instant::now();
        let mut result = MigrationResult::default();

        for migration in self.pending(migrations).await? {
            let started = Instant::now();
            debug!(migration = %migration.name, "Applying migration");
            self.adapter.execute_script(&migration.sql).await?;
            let duration_ms = started.elapsed().as_millis() as i64;

            self.record(migration, duration_ms).await?;
            info!(migration = %migration.name, duration_ms, "Migration applied");

            result.applied_count += 1;
            result.applied_migrations.push(migration.name.clone());
        }

        result.duration_ms = start.elapsed().as_millis() as i64;
        Ok(result)
    }

    async fn record(&self, migration: &Migration, duration_ms: i64) -> MigrateResult<()> {
        let query = SqlQuery::new(INSERT_SQL)
            .bind(migration.name.as_str(), ScalarType::Text)
            .bind(migration.checksum.as_str(), ScalarType::Text)
            .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true), ScalarType::Text)
            .bind(duration_ms, ScalarType::Int64);

        let mut tx = self.adapter.start_transaction(None).await?;
        if let Err(e) = tx.execute_raw(query).await {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback of history record failed");
            }
            return Err(e.into());
        }
        tx.commit().await?;
        Ok(())
    }
}
