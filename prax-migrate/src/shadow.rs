//! Trial runs against a shadow database.
//!
//! A shadow database is an isolated connection opened by the adapter
//! factory (in-memory unless configured otherwise). Applying every script
//! there first catches broken migrations before they touch real data.

use tracing::{debug, warn};

use prax_driver::{SqlDriverAdapter, SqlMigrationAwareDriverAdapterFactory};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::Migration;

/// Apply `migrations` to a fresh shadow database, then close it.
pub async fn verify_on_shadow<F>(factory: &F, migrations: &[Migration]) -> MigrateResult<()>
where
    F: SqlMigrationAwareDriverAdapterFactory,
{
    let shadow = factory
        .connect_to_shadow_db()
        .await
        .map_err(MigrationError::ShadowDatabaseError)?;

    let mut outcome = Ok(());
    for migration in migrations {
        debug!(migration = %migration.name, "Applying migration to shadow database");
        if let Err(e) = shadow.execute_script(&migration.sql).await {
            warn!(migration = %migration.name, error = %e, "Migration failed on shadow database");
            outcome = Err(MigrationError::ShadowDatabaseError(e));
            break;
        }
    }

    if let Err(e) = shadow.dispose().await {
        warn!(error = %e, "Failed to close shadow database");
        if outcome.is_ok() {
            outcome = Err(MigrationError::ShadowDatabaseError(e));
        }
    }
    outcome
}
