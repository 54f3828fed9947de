//! # prax-migrate
//!
//! Migration runner for Prax driver adapters.
//!
//! Driver adapters only know how to run a script. This crate adds the
//! bookkeeping on top: it loads ordered migration scripts from disk, applies
//! the ones not yet recorded in the `_prax_migrations` table, refuses to run
//! when an applied script was edited afterwards, and can rehearse the whole
//! set against a shadow database first.
//!
//! ## Example
//!
//! ```rust,no_run
//! use prax_driver::SqlDriverAdapterFactory;
//! use prax_migrate::{Migrator, load_migrations, verify_on_shadow};
//! use prax_sqlite::{SqliteAdapterFactory, SqliteConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = SqliteAdapterFactory::new(SqliteConfig::file("app.db"));
//! let migrations = load_migrations("./migrations").await?;
//!
//! verify_on_shadow(&factory, &migrations).await?;
//!
//! let adapter = factory.connect().await?;
//! let result = Migrator::new(&adapter).apply(&migrations).await?;
//! println!("Applied {} migrations in {}ms", result.applied_count, result.duration_ms);
//! # Ok(())
//! # }
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! migrations/
//! ├── 20231215120000_create_users/
//! │   └── migration.sql
//! └── 20231216090000_add_posts.sql
//! ```

pub mod engine;
pub mod error;
pub mod file;
pub mod history;
pub mod migration;
pub mod shadow;

// Re-exports
pub use engine::{MigrationResult, Migrator};
pub use error::{MigrateResult, MigrationError};
pub use file::load_migrations;
pub use history::MigrationRecord;
pub use migration::Migration;
pub use shadow::verify_on_shadow;
