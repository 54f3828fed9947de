//! Migration scripts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MigrateResult, MigrationError};

/// A migration script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Full name (`<version>_<name>`), unique and ordered by version.
    pub name: String,
    /// Version prefix of the name.
    pub version: String,
    /// SQL script to apply.
    pub sql: String,
    /// SHA-256 checksum of the script.
    pub checksum: String,
}

impl Migration {
    /// Create a migration from its full name and script.
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> MigrateResult<Self> {
        let name = name.into();
        let sql = sql.into();
        let (version, _) = parse_migration_name(&name)?;
        let checksum = compute_checksum(&sql);

        Ok(Self {
            name,
            version,
            sql,
            checksum,
        })
    }

    /// Verify the checksum matches the content.
    pub fn verify_checksum(&self) -> bool {
        compute_checksum(&self.sql) == self.checksum
    }

    /// The part of the name after the version.
    pub fn description(&self) -> &str {
        self.name
            .split_once('_')
            .map(|(_, description)| description)
            .unwrap_or_default()
    }
}

/// Compute a SHA256 checksum of the content.
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a migration name into (version, name).
pub fn parse_migration_name(full_name: &str) -> MigrateResult<(String, String)> {
    let Some((version, name)) = full_name.split_once('_') else {
        return Err(MigrationError::migration_file(format!(
            "invalid migration name format: {}. Expected: VERSION_NAME",
            full_name
        )));
    };

    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit()) {
        return Err(MigrationError::migration_file(format!(
            "invalid migration version (expected digits): {}",
            version
        )));
    }
    if name.is_empty() {
        return Err(MigrationError::migration_file(format!(
            "migration '{}' has no name after its version",
            full_name
        )));
    }

    Ok((version.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration =
            Migration::new("20240101120000_add_users", "CREATE TABLE users (id INT);").unwrap();

        assert_eq!(migration.version, "20240101120000");
        assert_eq!(migration.description(), "add_users");
        assert_eq!(migration.checksum.len(), 64);
        assert!(migration.verify_checksum());
    }

    #[test]
    fn test_migration_checksum_detects_edits() {
        let mut migration = Migration::new("1_init", "CREATE TABLE a (id INT);").unwrap();
        migration.sql.push_str("\nCREATE TABLE b (id INT);");
        assert!(!migration.verify_checksum());
    }

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(compute_checksum("a"), compute_checksum("b"));
    }

    #[test]
    fn test_parse_migration_name() {
        let (version, name) = parse_migration_name("20231215120000_create_users").unwrap();
        assert_eq!(version, "20231215120000");
        assert_eq!(name, "create_users");
    }

    #[test]
    fn test_parse_migration_name_invalid() {
        assert!(parse_migration_name("invalid").is_err());
        assert!(parse_migration_name("abc_test").is_err());
        assert!(parse_migration_name("001_").is_err());
    }
}
