//! Blocking SQLite connection.

use std::path::Path;

use keel_migrate::{Connection, Dialect, MigrateResult};
use rusqlite::types::ValueRef;
use rusqlite::{OptionalExtension, params_from_iter};
use tracing::{debug, trace};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::SqliteResult;

/// A SQLite database handle used for migrations and schema snapshots.
#[derive(Debug)]
pub struct SqliteDatabase {
    conn: rusqlite::Connection,
}

impl SqliteDatabase {
    /// Open a database described by `config` and apply its pragmas.
    pub fn open_with(config: &SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => rusqlite::Connection::open_in_memory()?,
            DatabasePath::File(path) => rusqlite::Connection::open(path)?,
        };
        debug!(path = ?config.path, "opened sqlite database");

        let init = config.init_sql();
        if !init.is_empty() {
            conn.execute_batch(&init)?;
        }
        Ok(Self { conn })
    }

    /// Open a file-based database with default settings.
    pub fn open(path: impl AsRef<Path>) -> SqliteResult<Self> {
        Self::open_with(&SqliteConfig::file(path))
    }

    /// Open a fresh in-memory database.
    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::open_with(&SqliteConfig::memory())
    }

    /// Open a database from a `sqlite:` URL.
    pub fn connect(url: &str) -> SqliteResult<Self> {
        Self::open_with(&SqliteConfig::from_url(url)?)
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Consume the wrapper, returning the underlying connection.
    pub fn into_inner(self) -> rusqlite::Connection {
        self.conn
    }
}

/// Render a column value as text.
pub(crate) fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl Connection for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str) -> MigrateResult<()> {
        trace!(sql = %sql, "executing batch");
        self.conn
            .execute_batch(sql)
            .map_err(|e| crate::SqliteError::from(e).into())
    }

    fn execute_with(&mut self, sql: &str, params: &[Option<&str>]) -> MigrateResult<u64> {
        trace!(sql = %sql, params = params.len(), "executing statement");
        let affected = self
            .conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(crate::SqliteError::from)?;
        Ok(affected as u64)
    }

    fn query_row(
        &mut self,
        sql: &str,
        params: &[Option<&str>],
    ) -> MigrateResult<Option<Vec<Option<String>>>> {
        trace!(sql = %sql, "querying row");
        let row = self
            .conn
            .query_row(sql, params_from_iter(params.iter()), |row| {
                let count = row.as_ref().column_count();
                (0..count)
                    .map(|i| row.get_ref(i).map(value_to_text))
                    .collect::<Result<Vec<_>, _>>()
            })
            .optional()
            .map_err(crate::SqliteError::from)?;
        Ok(row)
    }

    fn table_exists(&mut self, table: &str) -> MigrateResult<bool> {
        let (catalog, name) = match table.split_once('.') {
            Some((schema, name)) => (format!("\"{}\".sqlite_master", schema), name),
            None => ("sqlite_master".to_string(), table),
        };
        let sql = format!(
            "SELECT 1 FROM {} WHERE type = 'table' AND name = ?1",
            catalog
        );
        Ok(self.query_row(&sql, &[Some(name)])?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_execute_and_query_row() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (a TEXT, b INTEGER, c REAL); INSERT INTO t VALUES ('x', 2, NULL);")
            .unwrap();

        let row = db.query_row("SELECT a, b, c FROM t WHERE a = ?1", &[Some("x")]).unwrap();
        assert_eq!(row, Some(vec![Some("x".to_string()), Some("2".to_string()), None]));

        let missing = db.query_row("SELECT a FROM t WHERE a = ?1", &[Some("y")]).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_execute_with_counts_rows() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (a TEXT, b TEXT)").unwrap();
        db.execute_with("INSERT INTO t VALUES (?1, ?2)", &[Some("1"), None]).unwrap();
        db.execute_with("INSERT INTO t VALUES (?1, ?2)", &[Some("2"), None]).unwrap();

        let n = db.execute_with("UPDATE t SET b = ?1", &[Some("z")]).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_table_exists() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        assert!(!db.table_exists("migrations").unwrap());
        db.execute("CREATE TABLE migrations (name TEXT)").unwrap();
        assert!(db.table_exists("migrations").unwrap());
        assert!(db.table_exists("main.migrations").unwrap());
    }

    #[test]
    fn test_rollback_discards_changes() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        db.begin().unwrap();
        db.execute("CREATE TABLE t (a TEXT)").unwrap();
        db.rollback().unwrap();
        assert!(!db.table_exists("t").unwrap());
    }

    #[test]
    fn test_syntax_error_is_database_error() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        let err = db.execute("CREATE TABLE").unwrap_err();
        assert!(matches!(err, keel_migrate::MigrationError::Database(_)));
    }
}
