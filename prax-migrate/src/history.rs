//! Migration history tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prax_driver::ResultValue;

use crate::error::{MigrateResult, MigrationError};

/// Name of the bookkeeping table.
pub const HISTORY_TABLE: &str = "_prax_migrations";

/// SQL for initializing the migrations table.
pub const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "_prax_migrations" (
    name TEXT PRIMARY KEY,
    checksum TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    duration_ms INTEGER NOT NULL
);
"#;

/// SQL for reading applied migrations in order.
pub const SELECT_APPLIED_SQL: &str =
    r#"SELECT name, checksum, applied_at, duration_ms FROM "_prax_migrations" ORDER BY name"#;

/// SQL for recording an applied migration.
pub const INSERT_SQL: &str = concat!(
    r#"INSERT INTO "_prax_migrations" (name, checksum, applied_at, duration_ms) "#,
    "VALUES (?, ?, ?, ?)"
);

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration name.
    pub name: String,
    /// Checksum of the script when it was applied.
    pub checksum: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
    /// Duration of the migration in milliseconds.
    pub duration_ms: i64,
}

impl MigrationRecord {
    /// Build a record from a row of [`SELECT_APPLIED_SQL`].
    pub fn from_row(row: &[ResultValue]) -> MigrateResult<Self> {
        let text = |index: usize, column: &str| {
            row.get(index)
                .and_then(ResultValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    MigrationError::migration_file(format!("history row has no {}", column))
                })
        };

        let applied_at = text(2, "applied_at")?;
        let applied_at = DateTime::parse_from_rfc3339(&applied_at)
            .map_err(|e| {
                MigrationError::migration_file(format!(
                    "invalid applied_at '{}': {}",
                    applied_at, e
                ))
            })?
            .with_timezone(&Utc);

        let duration_ms = row
            .get(3)
            .and_then(ResultValue::as_i64)
            .ok_or_else(|| MigrationError::migration_file("history row has no duration_ms"))?;

        Ok(Self {
            name: text(0, "name")?,
            checksum: text(1, "checksum")?,
            applied_at,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_row() {
        let row = vec![
            ResultValue::Text("20231215_create_users".into()),
            ResultValue::Text("abc123".into()),
            ResultValue::Text("2024-01-01T00:00:00.000Z".into()),
            ResultValue::Text("150".into()),
        ];
        let record = MigrationRecord::from_row(&row).unwrap();

        assert_eq!(record.name, "20231215_create_users");
        assert_eq!(record.duration_ms, 150);
        assert_eq!(record.applied_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_record_from_short_row() {
        let row = vec![ResultValue::Text("x".into())];
        assert!(MigrationRecord::from_row(&row).is_err());
    }

    #[test]
    fn test_init_sql_has_table() {
        assert!(INIT_SQL.contains(HISTORY_TABLE));
        assert!(INIT_SQL.contains("checksum"));
        assert!(INSERT_SQL.contains(HISTORY_TABLE));
    }
}
