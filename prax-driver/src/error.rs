//! Driver error taxonomy.
//!
//! Every engine failure that leaves an adapter is either a [`DriverError`]
//! tagged with a [`DriverErrorKind`], or the original native error passed
//! through unchanged as [`AdapterError::Native`] when the adapter could not
//! recognize it at all.
//!
//! # Error Codes
//!
//! Each kind carries a stable code following the Prax pattern:
//! - 1xxx: Configuration and request errors
//! - 2xxx: Constraint violations and missing schema objects
//! - 3xxx: Resource and timeout errors
//! - 9xxx: Unrecognized driver errors
//!
//! ```rust
//! use prax_driver::{Constraint, DriverError, DriverErrorKind};
//!
//! let err = DriverError::new(DriverErrorKind::UniqueConstraintViolation {
//!     constraint: Some(Constraint::fields(["email"])),
//! })
//! .with_original("2067", "UNIQUE constraint failed: users.email");
//!
//! assert_eq!(err.kind.code(), "P2002");
//! assert_eq!(err.original_code.as_deref(), Some("2067"));
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// The constraint a violation refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    /// The columns covered by the constraint.
    Fields(Vec<String>),
    /// A foreign key whose columns could not be determined.
    ForeignKey {},
}

impl Constraint {
    /// Create a field-list constraint.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }
}

/// The closed taxonomy of driver errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum DriverErrorKind {
    /// The engine gave up waiting for a lock.
    Timeout,
    /// A unique or primary key constraint was violated.
    UniqueConstraintViolation {
        /// The constraint, when it could be parsed from the message.
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<Constraint>,
    },
    /// A not-null constraint was violated.
    NullConstraintViolation {
        /// The constraint, when it could be parsed from the message.
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<Constraint>,
    },
    /// A foreign key constraint was violated.
    ForeignKeyConstraintViolation {
        /// The constraint.
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<Constraint>,
    },
    /// The referenced table does not exist.
    TableDoesNotExist {
        /// Table name from the engine message.
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
    },
    /// The referenced column does not exist.
    ColumnNotFound {
        /// Column name from the engine message.
        #[serde(skip_serializing_if = "Option::is_none")]
        column: Option<String>,
    },
    /// The requested isolation level is not supported by the engine.
    InvalidIsolationLevel {
        /// The requested level.
        level: String,
    },
    /// The connection could not be configured as requested.
    ConfigurationError {
        /// What went wrong.
        message: String,
    },
    /// An argument could not be coerced to its declared type.
    InvalidInputValue {
        /// What went wrong.
        message: String,
    },
    /// The transaction was already committed or rolled back.
    TransactionAlreadyClosed {
        /// What was attempted.
        cause: String,
    },
    /// A bounded internal resource was exhausted.
    ResourceExhausted {
        /// The bound that was exceeded.
        limit: usize,
    },
    /// A native error with a code the classifier does not recognize.
    UnknownDriverError {
        /// Resolved canonical code.
        code: String,
        /// Native message.
        message: String,
    },
}

impl DriverErrorKind {
    /// Get the stable error code (e.g., "P2002").
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIsolationLevel { .. } => "P1001",
            Self::ConfigurationError { .. } => "P1002",
            Self::InvalidInputValue { .. } => "P1003",
            Self::TransactionAlreadyClosed { .. } => "P1004",
            Self::NullConstraintViolation { .. } => "P2001",
            Self::UniqueConstraintViolation { .. } => "P2002",
            Self::ForeignKeyConstraintViolation { .. } => "P2003",
            Self::TableDoesNotExist { .. } => "P2021",
            Self::ColumnNotFound { .. } => "P2022",
            Self::Timeout => "P3003",
            Self::ResourceExhausted { .. } => "P3004",
            Self::UnknownDriverError { .. } => "P9999",
        }
    }

    /// Get a short description of the kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Timeout => "Timed out waiting for a database lock",
            Self::UniqueConstraintViolation { .. } => "Unique constraint violation",
            Self::NullConstraintViolation { .. } => "Not null constraint violation",
            Self::ForeignKeyConstraintViolation { .. } => "Foreign key constraint violation",
            Self::TableDoesNotExist { .. } => "Table does not exist",
            Self::ColumnNotFound { .. } => "Column not found",
            Self::InvalidIsolationLevel { .. } => "Invalid isolation level",
            Self::ConfigurationError { .. } => "Invalid configuration",
            Self::InvalidInputValue { .. } => "Invalid input value",
            Self::TransactionAlreadyClosed { .. } => "Transaction already closed",
            Self::ResourceExhausted { .. } => "Resource exhausted",
            Self::UnknownDriverError { .. } => "Unknown driver error",
        }
    }
}

/// A classified driver error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverError {
    /// The taxonomy tag.
    #[serde(flatten)]
    pub kind: DriverErrorKind,
    /// The native code the error was classified from.
    pub original_code: Option<String>,
    /// The native message the error was classified from.
    pub original_message: Option<String>,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.kind.description())?;
        match &self.kind {
            DriverErrorKind::InvalidIsolationLevel { level } => write!(f, ": {}", level)?,
            DriverErrorKind::ConfigurationError { message }
            | DriverErrorKind::InvalidInputValue { message } => write!(f, ": {}", message)?,
            DriverErrorKind::TransactionAlreadyClosed { cause } => write!(f, ": {}", cause)?,
            DriverErrorKind::ResourceExhausted { limit } => write!(f, " (limit {})", limit)?,
            _ => {}
        }
        if let Some(message) = &self.original_message {
            write!(f, " ({})", message)?;
        }
        Ok(())
    }
}

impl DriverError {
    /// Create an error of the given kind without native details.
    pub fn new(kind: DriverErrorKind) -> Self {
        Self {
            kind,
            original_code: None,
            original_message: None,
        }
    }

    /// Attach the native code and message.
    pub fn with_original(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.original_code = Some(code.into());
        self.original_message = Some(message.into());
        self
    }

    // ============== Constructor Functions ==============

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::ConfigurationError {
            message: message.into(),
        })
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::InvalidInputValue {
            message: message.into(),
        })
    }

    /// Create an invalid isolation level error.
    pub fn invalid_isolation_level(level: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::InvalidIsolationLevel {
            level: level.into(),
        })
    }

    /// Create a transaction-closed error.
    pub fn transaction_closed(cause: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::TransactionAlreadyClosed {
            cause: cause.into(),
        })
    }

    /// Create a resource-exhausted error.
    pub fn resource_exhausted(limit: usize) -> Self {
        Self::new(DriverErrorKind::ResourceExhausted { limit })
    }

    // ============== Error Checks ==============

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, DriverErrorKind::Timeout)
    }

    /// Check if this is any constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.kind,
            DriverErrorKind::UniqueConstraintViolation { .. }
                | DriverErrorKind::NullConstraintViolation { .. }
                | DriverErrorKind::ForeignKeyConstraintViolation { .. }
        )
    }

    /// Constraint fields, if the kind carries a field list.
    pub fn constraint_fields(&self) -> Option<&[String]> {
        let constraint = match &self.kind {
            DriverErrorKind::UniqueConstraintViolation { constraint }
            | DriverErrorKind::NullConstraintViolation { constraint }
            | DriverErrorKind::ForeignKeyConstraintViolation { constraint } => constraint.as_ref(),
            _ => None,
        };
        match constraint {
            Some(Constraint::Fields(fields)) => Some(fields),
            _ => None,
        }
    }
}

/// Errors surfaced by a driver adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// A classified driver error.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A native error the adapter could not classify, passed through unchanged.
    #[error(transparent)]
    Native(Box<dyn std::error::Error + Send + Sync>),
}

impl AdapterError {
    /// Wrap a native error for pass-through.
    pub fn native<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Native(Box::new(err))
    }

    /// Get the classified error, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Driver(err) => Some(err),
            Self::Native(_) => None,
        }
    }

    /// Get the taxonomy kind, if the error was classified.
    pub fn kind(&self) -> Option<&DriverErrorKind> {
        self.driver_error().map(|err| &err.kind)
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        self.driver_error().is_some_and(DriverError::is_timeout)
    }
}

impl From<DriverErrorKind> for AdapterError {
    fn from(kind: DriverErrorKind) -> Self {
        Self::Driver(DriverError::new(kind))
    }
}
