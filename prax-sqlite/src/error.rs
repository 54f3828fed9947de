//! Error classification for SQLite failures.
//!
//! The engine reports failures inconsistently: sometimes with a symbolic
//! code such as `SQLITE_CONSTRAINT_UNIQUE`, sometimes with only the numeric
//! (extended) result code. Both shapes are first collapsed into a canonical
//! symbolic code, and only that code is dispatched on:
//!
//! 1. the symbolic code, when present
//! 2. the numeric code, through [`RESULT_CODES`] (extended codes missing
//!    from the table fall back to their primary code)
//! 3. [`UNKNOWN_CODE`]
//!
//! ```rust
//! use prax_sqlite::error::{NativeError, classify};
//! use prax_driver::DriverErrorKind;
//!
//! let native = NativeError::new("UNIQUE constraint failed: users.email").with_raw_code(2067);
//! let err = classify(&native).unwrap();
//!
//! assert!(matches!(err.kind, DriverErrorKind::UniqueConstraintViolation { .. }));
//! assert_eq!(err.constraint_fields(), Some(&["email".to_string()][..]));
//! ```

use prax_driver::{AdapterError, Constraint, DriverError, DriverErrorKind};
use thiserror::Error;
use tracing::trace;

/// Canonical code used when neither the symbolic nor the numeric code resolves.
pub const UNKNOWN_CODE: &str = "SQLITE_UNKNOWN";

/// Primary and constraint-specific extended result codes.
pub const RESULT_CODES: &[(i32, &str)] = &[
    (1, "SQLITE_ERROR"),
    (2, "SQLITE_INTERNAL"),
    (3, "SQLITE_PERM"),
    (4, "SQLITE_ABORT"),
    (5, "SQLITE_BUSY"),
    (6, "SQLITE_LOCKED"),
    (7, "SQLITE_NOMEM"),
    (8, "SQLITE_READONLY"),
    (9, "SQLITE_INTERRUPT"),
    (10, "SQLITE_IOERR"),
    (11, "SQLITE_CORRUPT"),
    (12, "SQLITE_NOTFOUND"),
    (13, "SQLITE_FULL"),
    (14, "SQLITE_CANTOPEN"),
    (15, "SQLITE_PROTOCOL"),
    (16, "SQLITE_EMPTY"),
    (17, "SQLITE_SCHEMA"),
    (18, "SQLITE_TOOBIG"),
    (19, "SQLITE_CONSTRAINT"),
    (20, "SQLITE_MISMATCH"),
    (21, "SQLITE_MISUSE"),
    (22, "SQLITE_NOLFS"),
    (23, "SQLITE_AUTH"),
    (24, "SQLITE_FORMAT"),
    (25, "SQLITE_RANGE"),
    (26, "SQLITE_NOTADB"),
    (787, "SQLITE_CONSTRAINT_FOREIGNKEY"),
    (1299, "SQLITE_CONSTRAINT_NOTNULL"),
    (1555, "SQLITE_CONSTRAINT_PRIMARYKEY"),
    (1811, "SQLITE_CONSTRAINT_TRIGGER"),
    (2067, "SQLITE_CONSTRAINT_UNIQUE"),
];

const CONSTRAINT_DELIMITER: &str = "constraint failed: ";

/// A native engine error, reduced to the parts the classifier looks at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct NativeError {
    /// Symbolic code (e.g., "SQLITE_BUSY").
    pub code: Option<String>,
    /// Numeric result code, possibly extended.
    pub raw_code: Option<i32>,
    /// Engine message.
    pub message: String,
}

impl NativeError {
    /// Create a native error with no codes.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            raw_code: None,
            message: message.into(),
        }
    }

    /// Set the symbolic code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the numeric code.
    pub fn with_raw_code(mut self, raw_code: i32) -> Self {
        self.raw_code = Some(raw_code);
        self
    }

    /// Extract the native parts of a rusqlite error.
    ///
    /// Errors raised by rusqlite itself (bad parameter counts, type
    /// mismatches) carry no engine code and yield `None`.
    pub fn from_rusqlite(err: &rusqlite::Error) -> Option<Self> {
        match err {
            rusqlite::Error::SqliteFailure(failure, message) => Some(
                Self::new(message.clone().unwrap_or_else(|| failure.to_string()))
                    .with_raw_code(failure.extended_code),
            ),
            other => other
                .sqlite_error()
                .map(|failure| Self::new(other.to_string()).with_raw_code(failure.extended_code)),
        }
    }

    /// Whether the classifier has anything to dispatch on.
    pub fn has_code(&self) -> bool {
        self.code.is_some() || self.raw_code.is_some()
    }

    /// The code reported back to the caller for diagnostics.
    pub fn original_code(&self) -> String {
        match (&self.raw_code, &self.code) {
            (Some(raw), _) => raw.to_string(),
            (None, Some(code)) => code.clone(),
            (None, None) => UNKNOWN_CODE.to_string(),
        }
    }
}

/// Look up the symbolic name of a numeric result code.
pub fn code_name(raw_code: i32) -> Option<&'static str> {
    let lookup = |code: i32| {
        RESULT_CODES
            .iter()
            .find(|(value, _)| *value == code)
            .map(|(_, name)| *name)
    };
    lookup(raw_code).or_else(|| lookup(raw_code & 0xff))
}

/// Resolve the canonical code of a native error.
pub fn canonical_code(native: &NativeError) -> &str {
    if let Some(code) = &native.code {
        return code;
    }
    native
        .raw_code
        .and_then(code_name)
        .unwrap_or(UNKNOWN_CODE)
}

/// Classify a native error.
///
/// Returns `None` when the error carries neither a symbolic nor a numeric
/// code; such errors are not the engine's and must be passed on unchanged.
pub fn classify(native: &NativeError) -> Option<DriverError> {
    if !native.has_code() {
        return None;
    }

    let code = canonical_code(native);
    let message = native.message.as_str();
    trace!(code = %code, message = %message, "Classifying engine error");

    let kind = match code {
        "SQLITE_BUSY" => DriverErrorKind::Timeout,
        "SQLITE_CONSTRAINT_UNIQUE" | "SQLITE_CONSTRAINT_PRIMARYKEY" => {
            DriverErrorKind::UniqueConstraintViolation {
                constraint: constraint_fields(message).map(Constraint::Fields),
            }
        }
        "SQLITE_CONSTRAINT_NOTNULL" => DriverErrorKind::NullConstraintViolation {
            constraint: constraint_fields(message).map(Constraint::Fields),
        },
        "SQLITE_CONSTRAINT_FOREIGNKEY" | "SQLITE_CONSTRAINT_TRIGGER" => {
            DriverErrorKind::ForeignKeyConstraintViolation {
                constraint: Some(Constraint::ForeignKey {}),
            }
        }
        _ => classify_message(code, message),
    };

    Some(DriverError::new(kind).with_original(native.original_code(), message))
}

fn classify_message(code: &str, message: &str) -> DriverErrorKind {
    if message.starts_with("no such table") {
        DriverErrorKind::TableDoesNotExist {
            table: message_suffix(message, ": "),
        }
    } else if message.starts_with("no such column") {
        DriverErrorKind::ColumnNotFound {
            column: message_suffix(message, ": "),
        }
    } else if message.contains("has no column named ") {
        DriverErrorKind::ColumnNotFound {
            column: message_suffix(message, "has no column named "),
        }
    } else {
        DriverErrorKind::UnknownDriverError {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// The first token after `delimiter`.
fn message_suffix(message: &str, delimiter: &str) -> Option<String> {
    message
        .split_once(delimiter)
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(str::to_string)
}

/// Column names listed after "constraint failed: ", without table prefixes.
fn constraint_fields(message: &str) -> Option<Vec<String>> {
    let (_, list) = message.split_once(CONSTRAINT_DELIMITER)?;
    let fields: Vec<String> = list
        .split(", ")
        .filter_map(|field| field.trim().rsplit('.').next())
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

/// Convert an engine failure into an adapter error.
///
/// Classified failures become [`AdapterError::Driver`]; anything else is
/// passed through unchanged as [`AdapterError::Native`].
pub fn convert_error(err: tokio_rusqlite::Error) -> AdapterError {
    let native = match &err {
        tokio_rusqlite::Error::Rusqlite(e) => NativeError::from_rusqlite(e),
        tokio_rusqlite::Error::Close((_, e)) => NativeError::from_rusqlite(e),
        tokio_rusqlite::Error::Other(e) => e.downcast_ref::<NativeError>().cloned(),
        _ => None,
    };

    match native.as_ref().and_then(classify) {
        Some(classified) => AdapterError::Driver(classified),
        None => AdapterError::native(err),
    }
}

/// Convert a rusqlite failure into an adapter error.
pub fn convert_rusqlite_error(err: rusqlite::Error) -> AdapterError {
    convert_error(tokio_rusqlite::Error::Rusqlite(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_raw(raw_code: i32, message: &str) -> DriverError {
        classify(&NativeError::new(message).with_raw_code(raw_code)).unwrap()
    }

    #[test]
    fn test_canonical_code_prefers_symbolic() {
        let native = NativeError::new("x").with_code("SQLITE_BUSY").with_raw_code(2067);
        assert_eq!(canonical_code(&native), "SQLITE_BUSY");
    }

    #[test]
    fn test_canonical_code_numeric_fallback() {
        assert_eq!(
            canonical_code(&NativeError::new("x").with_raw_code(1555)),
            "SQLITE_CONSTRAINT_PRIMARYKEY"
        );
        // SQLITE_BUSY_RECOVERY resolves through its primary code
        assert_eq!(canonical_code(&NativeError::new("x").with_raw_code(261)), "SQLITE_BUSY");
        assert_eq!(canonical_code(&NativeError::new("x").with_raw_code(99)), UNKNOWN_CODE);
    }

    #[test]
    fn test_no_codes_is_not_classified() {
        assert!(classify(&NativeError::new("no such table: users")).is_none());
    }

    #[test]
    fn test_busy_is_timeout() {
        let err = classify_raw(5, "database is locked");
        assert!(err.is_timeout());
        assert_eq!(err.original_code.as_deref(), Some("5"));
        assert_eq!(err.original_message.as_deref(), Some("database is locked"));
    }

    #[test]
    fn test_unique_composite_fields() {
        let err = classify_raw(2067, "UNIQUE constraint failed: members.team_id, members.user_id");
        assert!(matches!(err.kind, DriverErrorKind::UniqueConstraintViolation { .. }));
        assert_eq!(
            err.constraint_fields().unwrap(),
            &["team_id".to_string(), "user_id".to_string()]
        );
    }

    #[test]
    fn test_symbolic_primary_key() {
        let native = NativeError::new("UNIQUE constraint failed: users.id")
            .with_code("SQLITE_CONSTRAINT_PRIMARYKEY");
        let err = classify(&native).unwrap();
        assert_eq!(err.constraint_fields().unwrap(), &["id".to_string()]);
        assert_eq!(err.original_code.as_deref(), Some("SQLITE_CONSTRAINT_PRIMARYKEY"));
    }

    #[test]
    fn test_not_null() {
        let err = classify_raw(1299, "NOT NULL constraint failed: users.name");
        assert!(matches!(err.kind, DriverErrorKind::NullConstraintViolation { .. }));
        assert_eq!(err.constraint_fields().unwrap(), &["name".to_string()]);
    }

    #[test]
    fn test_foreign_key() {
        let err = classify_raw(787, "FOREIGN KEY constraint failed");
        assert_eq!(
            err.kind,
            DriverErrorKind::ForeignKeyConstraintViolation {
                constraint: Some(Constraint::ForeignKey {})
            }
        );
    }

    #[test]
    fn test_missing_table() {
        let err = classify_raw(1, "no such table: main.users");
        assert_eq!(
            err.kind,
            DriverErrorKind::TableDoesNotExist {
                table: Some("main.users".into())
            }
        );
    }

    #[test]
    fn test_missing_column() {
        let err = classify_raw(1, "no such column: age");
        assert_eq!(err.kind, DriverErrorKind::ColumnNotFound { column: Some("age".into()) });

        let err = classify_raw(1, "table users has no column named nickname");
        assert_eq!(
            err.kind,
            DriverErrorKind::ColumnNotFound {
                column: Some("nickname".into())
            }
        );
    }

    #[test]
    fn test_unmatched_code_is_unknown_driver_error() {
        let err = classify_raw(1, "near \"SELEC\": syntax error");
        assert!(matches!(
            err.kind,
            DriverErrorKind::UnknownDriverError { ref code, .. } if code == "SQLITE_ERROR"
        ));
    }

    #[test]
    fn test_convert_error_passthrough() {
        let err = convert_error(tokio_rusqlite::Error::ConnectionClosed);
        match err {
            AdapterError::Native(inner) => {
                assert!(inner.downcast_ref::<tokio_rusqlite::Error>().is_some());
            }
            other => panic!("expected pass-through, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_rusqlite_failure() {
        let failure = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(2067),
            Some("UNIQUE constraint failed: users.email".to_string()),
        );
        let err = convert_rusqlite_error(failure);
        assert!(matches!(
            err.kind(),
            Some(DriverErrorKind::UniqueConstraintViolation { .. })
        ));
    }
}
