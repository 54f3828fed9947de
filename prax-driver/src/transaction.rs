//! Transaction options and isolation levels.
//!
//! # Isolation Levels
//!
//! ```rust
//! use prax_driver::IsolationLevel;
//!
//! let level: IsolationLevel = "REPEATABLE READ".parse().unwrap();
//! assert_eq!(level, IsolationLevel::RepeatableRead);
//! assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
//! ```
//!
//! # Phantom Queries
//!
//! A transaction either issues `COMMIT` / `ROLLBACK` itself, or leaves them
//! to the caller, who sends them as ordinary statements before calling
//! `commit()` / `rollback()` to release the write lock:
//!
//! ```rust
//! use prax_driver::TransactionOptions;
//!
//! let options = TransactionOptions::default();
//! assert!(!options.use_phantom_query);
//!
//! let options = TransactionOptions::new().phantom_query(true);
//! assert!(options.use_phantom_query);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::DriverError;

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    /// Read uncommitted - allows dirty reads.
    ReadUncommitted,
    /// Read committed - prevents dirty reads.
    ReadCommitted,
    /// Repeatable read - prevents non-repeatable reads.
    RepeatableRead,
    /// Snapshot isolation.
    Snapshot,
    /// Serializable - highest isolation level.
    Serializable,
}

impl IsolationLevel {
    /// Get the SQL clause for this isolation level.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Snapshot => "SNAPSHOT",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for IsolationLevel {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('_', " ").as_str() {
            "READ UNCOMMITTED" => Ok(Self::ReadUncommitted),
            "READ COMMITTED" => Ok(Self::ReadCommitted),
            "REPEATABLE READ" => Ok(Self::RepeatableRead),
            "SNAPSHOT" => Ok(Self::Snapshot),
            "SERIALIZABLE" => Ok(Self::Serializable),
            _ => Err(DriverError::invalid_isolation_level(s)),
        }
    }
}

/// Options a transaction was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOptions {
    /// When set, the caller issues `COMMIT` / `ROLLBACK` as ordinary
    /// statements and the transaction object only releases the write lock.
    pub use_phantom_query: bool,
}

impl TransactionOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set phantom query mode.
    pub fn phantom_query(mut self, enabled: bool) -> Self {
        self.use_phantom_query = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverErrorKind;

    #[test]
    fn test_isolation_level_parse() {
        assert_eq!(
            "serializable".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::Serializable
        );
        assert_eq!(
            "READ_COMMITTED".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::ReadCommitted
        );
    }

    #[test]
    fn test_isolation_level_parse_invalid() {
        let err = "CHAOS".parse::<IsolationLevel>().unwrap_err();
        assert!(matches!(
            err.kind,
            DriverErrorKind::InvalidIsolationLevel { ref level } if level == "CHAOS"
        ));
    }

    #[test]
    fn test_isolation_level_sql() {
        assert_eq!(IsolationLevel::ReadUncommitted.as_sql(), "READ UNCOMMITTED");
        assert_eq!(IsolationLevel::Snapshot.to_string(), "SNAPSHOT");
    }
}
