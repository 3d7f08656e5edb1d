//! Database URL dispatch.

use keel_codegen::SchemaSnapshot;
use keel_migrate::Connection;

use crate::error::{CliError, CliResult};

/// Driver selected by a URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `sqlite:` URLs.
    Sqlite,
    /// `postgres://` and `postgresql://` URLs.
    Postgres,
}

impl Backend {
    /// Pick the backend for a URL.
    pub fn detect(url: &str) -> CliResult<Self> {
        if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else {
            Err(CliError::database(format!("unsupported database URL '{}'", url)))
        }
    }
}

/// An open database connection.
#[derive(Debug)]
pub enum Database {
    #[cfg(feature = "sqlite")]
    Sqlite(keel_sqlite::SqliteDatabase),
    #[cfg(feature = "postgres")]
    Postgres(keel_postgres::PostgresDatabase),
}

impl Database {
    /// Connect to the database a URL names.
    pub fn connect(url: &str) -> CliResult<Self> {
        match Backend::detect(url)? {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Ok(Self::Sqlite(keel_sqlite::SqliteDatabase::connect(url)?)),
            #[cfg(feature = "postgres")]
            Backend::Postgres => Ok(Self::Postgres(keel_postgres::PostgresDatabase::connect(url)?)),
            #[allow(unreachable_patterns)]
            backend => Err(CliError::database(format!(
                "keel was built without {:?} support",
                backend
            ))),
        }
    }

    /// The connection used by the migration engine.
    pub fn connection(&mut self) -> &mut dyn Connection {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(db) => db,
            #[cfg(feature = "postgres")]
            Self::Postgres(db) => db,
        }
    }

    /// The schema source used by the generator.
    pub fn snapshot(&mut self) -> &mut dyn SchemaSnapshot {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(db) => db,
            #[cfg(feature = "postgres")]
            Self::Postgres(db) => db,
        }
    }
}
