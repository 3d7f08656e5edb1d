//! The database seam consumed by the engine and by migration units.
//!
//! Drivers (`keel-sqlite`, `keel-postgres`) implement [`Connection`] for their
//! native client. The engine only needs a handful of primitives: run a
//! statement, run a parameterized statement, fetch one text row, check that a
//! table exists, and delimit a transaction.

use std::fmt;

use crate::error::MigrateResult;

/// SQL dialect of a connection.
///
/// Governs bind-parameter placeholders and the statement boundaries used
/// when splitting migration content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    MySql,
}

impl Dialect {
    /// Bind-parameter placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Sqlite | Self::MySql => "?".to_string(),
            Self::Postgres => format!("${}", index),
        }
    }

    /// Comma-separated placeholders for `count` parameters.
    pub fn placeholders(&self, count: usize) -> String {
        (1..=count)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgresql"),
            Self::MySql => write!(f, "mysql"),
        }
    }
}

/// A single blocking database connection.
///
/// Parameters are passed as optional text values since the ledger only ever
/// stores text columns.
pub trait Connection {
    /// Dialect spoken by this connection.
    fn dialect(&self) -> Dialect;

    /// Execute a statement (or a batch without parameters).
    fn execute(&mut self, sql: &str) -> MigrateResult<()>;

    /// Execute a parameterized statement and return the number of affected rows.
    fn execute_with(&mut self, sql: &str, params: &[Option<&str>]) -> MigrateResult<u64>;

    /// Fetch the first row of a query as text columns, if any row matches.
    fn query_row(
        &mut self,
        sql: &str,
        params: &[Option<&str>],
    ) -> MigrateResult<Option<Vec<Option<String>>>>;

    /// Check whether a table with the given (optionally schema-qualified) name exists.
    fn table_exists(&mut self, table: &str) -> MigrateResult<bool>;

    /// Open a transaction.
    fn begin(&mut self) -> MigrateResult<()> {
        self.execute("BEGIN")
    }

    /// Commit the open transaction.
    fn commit(&mut self) -> MigrateResult<()> {
        self.execute("COMMIT")
    }

    /// Roll back the open transaction.
    fn rollback(&mut self) -> MigrateResult<()> {
        self.execute("ROLLBACK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Sqlite.placeholders(3), "?, ?, ?");
        assert_eq!(Dialect::Postgres.placeholders(3), "$1, $2, $3");
        assert_eq!(Dialect::MySql.placeholder(7), "?");
    }

    #[test]
    fn test_dialect_display() {
        assert_eq!(Dialect::Postgres.to_string(), "postgresql");
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
    }
}
