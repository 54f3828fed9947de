//! Error types for the migration runner.

use prax_driver::AdapterError;
use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(#[from] AdapterError),

    /// Invalid migration file or format.
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// An applied migration was modified afterwards.
    #[error("Checksum mismatch for migration '{name}': recorded {expected}, found {actual}")]
    ChecksumMismatch {
        /// Migration name.
        name: String,
        /// Checksum recorded when the migration was applied.
        expected: String,
        /// Checksum of the migration as it is now.
        actual: String,
    },

    /// A migration failed against the shadow database.
    #[error("Shadow database error: {0}")]
    ShadowDatabaseError(#[source] AdapterError),
}

impl MigrationError {
    /// Create an invalid migration error.
    pub fn migration_file(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Get the underlying adapter error, if any.
    pub fn adapter_error(&self) -> Option<&AdapterError> {
        match self {
            Self::Database(e) | Self::ShadowDatabaseError(e) => Some(e),
            _ => None,
        }
    }
}
