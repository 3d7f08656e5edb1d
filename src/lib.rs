//! # Keel
//!
//! Ledger-tracked SQL migrations and foreign-key-aware model generation.
//!
//! Keel provides:
//! - A migration runner that records every applied migration with its
//!   content hash and parent, and reports drift on later runs
//! - A fix mode that rewrites drifted ledger entries in place
//! - A model generator that orders tables by their foreign keys and
//!   refuses to exclude a table that another table depends on
//! - Drivers for SQLite and PostgreSQL
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keel::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut db = SqliteDatabase::connect("sqlite:app.db")?;
//!     let migrations = discover(["migrations/*.sql"])?;
//!
//!     let result = MigrationEngine::new(MigrationConfig::new())
//!         .with_observer(TracingObserver)
//!         .migrate(&mut db, &migrations)?;
//!     println!("{}", result.summary());
//!
//!     let generator = Generator::from_config("keel.toml")?;
//!     generator.generate(&mut db, &generator.default_renderer())?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration engine, ledger and migration sources.
pub mod migrate {
    pub use keel_migrate::*;
}

/// Schema snapshots, dependency resolution and model rendering.
pub mod codegen {
    pub use keel_codegen::*;
}

/// SQLite driver.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use keel_sqlite::*;
}

/// PostgreSQL driver.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use keel_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use keel_codegen::{
        CodegenError, Generator, GeneratorConfig, SchemaSnapshot, SnapshotOptions, TableFilter,
    };
    pub use keel_migrate::{
        Connection, FnMigration, Migration, MigrationConfig, MigrationEngine, MigrationError,
        MigrationResult, MigrationWarning, SqlMigration, TracingObserver, discover,
    };

    #[cfg(feature = "postgres")]
    pub use keel_postgres::{PgConfig, PostgresDatabase};
    #[cfg(feature = "sqlite")]
    pub use keel_sqlite::{SqliteConfig, SqliteDatabase};
}

// Re-export key types at the crate root
pub use keel_codegen::{CodegenError, Generator};
pub use keel_migrate::{MigrationEngine, MigrationError, MigrationResult};
