//! # Prax Driver Adapters
//!
//! The layer between the Prax query engine and a concrete database engine.
//!
//! - [`driver`]: the adapter protocol (wire types, error taxonomy, traits)
//! - [`sqlite`]: the SQLite adapter
//! - [`migrate`]: a migration runner on top of any adapter
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prax_driver_adapters::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     prax_driver_adapters::driver::logging::init();
//!
//!     let factory = SqliteAdapterFactory::from_url("sqlite://./app.db?wal=true")?;
//!     let adapter = factory.connect().await?;
//!
//!     let result = adapter
//!         .query_raw(SqlQuery::new("SELECT ? AS answer").bind(42, ScalarType::Int32))
//!         .await?;
//!     println!("{:?}", result.rows);
//!
//!     adapter.dispose().await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The driver adapter protocol.
pub mod driver {
    pub use prax_driver::*;
}

/// The SQLite adapter.
pub mod sqlite {
    pub use prax_sqlite::*;
}

/// The migration runner.
pub mod migrate {
    pub use prax_migrate::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use prax_driver::{
        AdapterError, AdapterResult, ArgValue, DriverError, DriverErrorKind, IsolationLevel,
        Queryable, ResultSet, ResultValue, ScalarType, SqlDriverAdapter, SqlDriverAdapterFactory,
        SqlMigrationAwareDriverAdapterFactory, SqlQuery, Transaction,
    };
    pub use prax_migrate::{Migration, Migrator, load_migrations, verify_on_shadow};
    pub use prax_sqlite::{SqliteAdapter, SqliteAdapterFactory, SqliteConfig, WalConfig};
}

// Re-export key types at the crate root
pub use prax_driver::{AdapterError, DriverError};
