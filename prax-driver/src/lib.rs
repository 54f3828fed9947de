//! # prax-driver
//!
//! The driver adapter protocol for the Prax ORM.
//!
//! The query engine talks to every database through the same small surface:
//! statements with typed positional arguments go in, positional rows with
//! one resolved [`ScalarType`] per column come out, and failures are mapped
//! onto a closed [`DriverErrorKind`] taxonomy. Drivers such as `prax-sqlite`
//! implement the traits in [`adapter`].
//!
//! ## Statements
//!
//! ```rust
//! use prax_driver::{ArgValue, ScalarType, SqlQuery};
//!
//! let query = SqlQuery::new("UPDATE users SET active = ? WHERE id = ?")
//!     .bind(true, ScalarType::Boolean)
//!     .bind(42, ScalarType::Int32);
//!
//! assert_eq!(query.args[0], ArgValue::Bool(true));
//! ```
//!
//! ## Errors
//!
//! ```rust
//! use prax_driver::{AdapterError, DriverError, DriverErrorKind};
//!
//! let err: AdapterError = DriverError::new(DriverErrorKind::Timeout)
//!     .with_original("5", "database is locked")
//!     .into();
//!
//! assert!(err.is_timeout());
//! ```

pub mod adapter;
pub mod error;
pub mod logging;
pub mod transaction;
pub mod types;

pub use adapter::{
    Queryable, SqlDriverAdapter, SqlDriverAdapterFactory, SqlMigrationAwareDriverAdapterFactory,
    Transaction,
};
pub use error::{AdapterError, AdapterResult, Constraint, DriverError, DriverErrorKind};
pub use transaction::{IsolationLevel, TransactionOptions};
pub use types::{ArgValue, ConnectionInfo, ResultSet, ResultValue, ScalarType, SqlQuery};
