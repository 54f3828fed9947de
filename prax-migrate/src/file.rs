//! Loading migrations from disk.
//!
//! A migrations directory holds one entry per migration, either a
//! directory containing `migration.sql` or a single `.sql` file:
//!
//! ```text
//! migrations/
//! ├── 20240101120000_create_users/
//! │   └── migration.sql
//! └── 20240102090000_add_posts.sql
//! ```
//!
//! Entries are applied in name order. Anything else in the directory is
//! ignored.

use std::path::Path;

use tracing::debug;

use crate::error::MigrateResult;
use crate::migration::Migration;

/// Script file name inside a migration directory.
pub const MIGRATION_FILE: &str = "migration.sql";

/// Load every migration under `dir`, sorted by name.
///
/// A missing directory yields no migrations.
pub async fn load_migrations(dir: impl AsRef<Path>) -> MigrateResult<Vec<Migration>> {
    let dir = dir.as_ref();
    let mut migrations = Vec::new();

    if !tokio::fs::try_exists(dir).await? {
        return Ok(migrations);
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let file_type = entry.file_type().await?;

        if file_type.is_dir() {
            let script = path.join(MIGRATION_FILE);
            if !tokio::fs::try_exists(&script).await? {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let sql = tokio::fs::read_to_string(&script).await?;
            migrations.push(Migration::new(name, sql)?);
        } else if path.extension().is_some_and(|ext| ext == "sql") {
            let Some(name) = path.file_stem().and_then(|n| n.to_str()) else {
                continue;
            };
            let sql = tokio::fs::read_to_string(&path).await?;
            migrations.push(Migration::new(name, sql)?);
        }
    }

    migrations.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(dir = %dir.display(), count = migrations.len(), "Loaded migrations");
    Ok(migrations)
}
