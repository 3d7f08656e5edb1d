//! SQLite driver for keel.
//!
//! [`SqliteDatabase`] wraps a blocking `rusqlite` connection and implements
//! both [`keel_migrate::Connection`] (for running migrations) and
//! [`keel_codegen::SchemaSnapshot`] (for reading the catalog during model
//! generation).
//!
//! # Example
//!
//! ```rust,ignore
//! use keel_migrate::{MigrationConfig, MigrationEngine, discover};
//! use keel_sqlite::SqliteDatabase;
//!
//! let mut db = SqliteDatabase::connect("sqlite://app.db")?;
//! let migrations = discover(["migrations/*.sql"])?;
//! let result = MigrationEngine::new(MigrationConfig::default()).migrate(&mut db, &migrations)?;
//! println!("{}", result);
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod snapshot;

pub use config::{DatabasePath, JournalMode, SqliteConfig};
pub use connection::SqliteDatabase;
pub use error::{SqliteError, SqliteResult};
