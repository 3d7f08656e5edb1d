//! The ledger: a table recording which migrations were applied, in which
//! order (through parent links) and with which content hash.
//!
//! Rows are only ever inserted, or updated in place on the `hash` and
//! `parent` columns when the engine runs in fix mode.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connection::Connection;
use crate::error::{LedgerOperation, MigrateResult, MigrationError};

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Migration name (primary key).
    pub name: String,
    /// Name of the migration preceding this one in the run that applied it.
    pub parent: Option<String>,
    /// Hash of the migration when it was applied.
    pub hash: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// Create a record stamped with the current time.
    pub fn now(name: impl Into<String>, parent: Option<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent,
            hash: hash.into(),
            applied_at: Utc::now(),
        }
    }
}

/// Access to the ledger table.
#[derive(Debug, Clone)]
pub struct Ledger {
    table_name: String,
    text_type: String,
}

impl Ledger {
    /// Create a ledger handle for a table using the given text column type.
    pub fn new(table_name: impl Into<String>, text_type: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            text_type: text_type.into(),
        }
    }

    /// Ledger table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// SQL creating the ledger table.
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE {table} (\n    \
                 name {text} NOT NULL PRIMARY KEY,\n    \
                 parent {text},\n    \
                 hash {text} NOT NULL,\n    \
                 applied_at {text} NOT NULL\n\
             )",
            table = self.table_name,
            text = self.text_type,
        )
    }

    /// Create the ledger table if it does not exist yet.
    ///
    /// Returns `true` when the table was created.
    pub fn ensure_table(&self, conn: &mut dyn Connection) -> MigrateResult<bool> {
        let exists = conn
            .table_exists(&self.table_name)
            .map_err(|e| self.error(LedgerOperation::Check, e))?;
        if exists {
            return Ok(false);
        }

        debug!(table = %self.table_name, "creating ledger table");
        conn.execute(&self.create_table_sql())
            .map_err(|e| self.error(LedgerOperation::Create, e))?;
        Ok(true)
    }

    /// Look up the record for a migration.
    pub fn get(&self, conn: &mut dyn Connection, name: &str) -> MigrateResult<Option<LedgerRecord>> {
        let sql = format!(
            "SELECT parent, hash, applied_at FROM {} WHERE name = {}",
            self.table_name,
            conn.dialect().placeholder(1)
        );

        let row = conn
            .query_row(&sql, &[Some(name)])
            .map_err(|e| self.error(LedgerOperation::Read, e))?;

        let Some(mut row) = row else {
            return Ok(None);
        };
        if row.len() != 3 {
            return Err(self.error(
                LedgerOperation::Read,
                MigrationError::invalid_record(name, format!("expected 3 columns, got {}", row.len())),
            ));
        }

        let applied_at = row.pop().flatten();
        let hash = row.pop().flatten();
        let parent = row.pop().flatten();

        let hash = hash.ok_or_else(|| {
            self.error(
                LedgerOperation::Read,
                MigrationError::invalid_record(name, "hash is NULL"),
            )
        })?;
        let applied_at = applied_at
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                self.error(
                    LedgerOperation::Read,
                    MigrationError::invalid_record(
                        name,
                        format!("unparseable applied_at {:?}", applied_at),
                    ),
                )
            })?;

        Ok(Some(LedgerRecord {
            name: name.to_string(),
            parent,
            hash,
            applied_at,
        }))
    }

    /// Insert a new record.
    pub fn insert(&self, conn: &mut dyn Connection, record: &LedgerRecord) -> MigrateResult<()> {
        let sql = format!(
            "INSERT INTO {} (name, parent, hash, applied_at) VALUES ({})",
            self.table_name,
            conn.dialect().placeholders(4)
        );
        let applied_at = format_timestamp(&record.applied_at);

        conn.execute_with(
            &sql,
            &[
                Some(record.name.as_str()),
                record.parent.as_deref(),
                Some(record.hash.as_str()),
                Some(applied_at.as_str()),
            ],
        )
        .map_err(|e| self.error(LedgerOperation::Insert, e))?;
        Ok(())
    }

    /// Overwrite the recorded hash of a migration.
    pub fn update_hash(&self, conn: &mut dyn Connection, name: &str, hash: &str) -> MigrateResult<()> {
        self.update_column(conn, "hash", name, Some(hash))
    }

    /// Overwrite the recorded parent of a migration.
    pub fn update_parent(
        &self,
        conn: &mut dyn Connection,
        name: &str,
        parent: Option<&str>,
    ) -> MigrateResult<()> {
        self.update_column(conn, "parent", name, parent)
    }

    fn update_column(
        &self,
        conn: &mut dyn Connection,
        column: &str,
        name: &str,
        value: Option<&str>,
    ) -> MigrateResult<()> {
        let dialect = conn.dialect();
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE name = {}",
            self.table_name,
            column,
            dialect.placeholder(1),
            dialect.placeholder(2)
        );

        let updated = conn
            .execute_with(&sql, &[value, Some(name)])
            .map_err(|e| self.error(LedgerOperation::Update, e))?;
        if updated != 1 {
            return Err(self.error(
                LedgerOperation::Update,
                MigrationError::invalid_record(name, format!("expected 1 row updated, got {}", updated)),
            ));
        }
        Ok(())
    }

    fn error(&self, operation: LedgerOperation, source: MigrationError) -> MigrationError {
        MigrationError::ledger(&self.table_name, operation, source)
    }
}

/// Format a timestamp the way it is stored in the ledger (RFC 3339, UTC).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Accepts RFC 3339 and naive ISO-8601 (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.and_utc())
}

/// Check that a ledger table name is a plain identifier, optionally
/// qualified by one schema name.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_create_table_sql() {
        let sql = Ledger::new("_keel_migrations", "VARCHAR(255)").create_table_sql();
        assert!(sql.starts_with("CREATE TABLE _keel_migrations ("));
        assert!(sql.contains("name VARCHAR(255) NOT NULL PRIMARY KEY"));
        assert!(sql.contains("parent VARCHAR(255),"));
        assert!(sql.contains("applied_at VARCHAR(255) NOT NULL"));
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let raw = format_timestamp(&ts);
        assert_eq!(raw, "2024-03-01T12:30:00.000000Z");
        assert_eq!(parse_timestamp(&raw), Some(ts));
    }

    #[test]
    fn test_parse_naive_timestamp() {
        let ts = parse_timestamp("2023-11-05T08:00:01.250000").unwrap();
        assert_eq!(ts.timestamp_millis() % 1000, 250);
        assert!(parse_timestamp("2023-11-05 08:00:01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("migrations"));
        assert!(is_valid_table_name("public._keel_migrations"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("1migrations"));
        assert!(!is_valid_table_name("a.b.c"));
        assert!(!is_valid_table_name("migrations; DROP TABLE users"));
    }
}
