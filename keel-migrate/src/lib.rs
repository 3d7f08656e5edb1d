//! # keel-migrate
//!
//! Ledger-tracked migration runner.
//!
//! This crate provides:
//! - Migration units: SQL content, closures, statically linked modules and
//!   registered scripts
//! - A ledger table recording every applied unit with its parent and hash
//! - Drift detection (hash or parent changed since application) with an
//!   optional fix mode that writes the current values back
//! - Lifecycle observers for presentation layers
//! - Dialect-aware statement splitting
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Migrations   │────▶│ Engine         │────▶│ Ledger      │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              │
//!                              ▼
//!                      ┌────────────────┐
//!                      │ Observers      │
//!                      └────────────────┘
//! ```
//!
//! A run is a single transaction: either every unit and ledger write
//! commits, or nothing does.
//!
//! ## Example
//!
//! ```rust,ignore
//! use keel_migrate::{MigrationConfig, MigrationEngine, TracingObserver, discover};
//!
//! let migrations = discover(["migrations/*.sql"])?;
//! let engine = MigrationEngine::new(MigrationConfig::new().fix_warnings(true))
//!     .with_observer(TracingObserver);
//!
//! let result = engine.migrate(&mut conn, &migrations)?;
//! println!("{}", result.summary());
//! ```

pub mod connection;
pub mod engine;
pub mod error;
pub mod file;
pub mod ledger;
pub mod migration;
pub mod observer;
pub mod plugin;
pub mod split;
pub mod warning;

// Re-exports
pub use connection::{Connection, Dialect};
pub use engine::{
    MigrationConfig, MigrationEngine, MigrationOutcome, MigrationResult, MigrationStatus, classify,
};
pub use error::{LedgerOperation, MigrateResult, MigrationError};
pub use file::{MigrationFileManager, MigrationKind, discover};
pub use ledger::{Ledger, LedgerRecord};
pub use migration::{FnMigration, Migration, NULL_HASH, SqlMigration, content_hash};
pub use observer::{CompositeObserver, MigrationObserver, NoopObserver, TracingObserver};
pub use plugin::{EntryPoint, ModuleMigration, PluginRegistry, ScriptMigration};
pub use split::split_statements;
pub use warning::MigrationWarning;
