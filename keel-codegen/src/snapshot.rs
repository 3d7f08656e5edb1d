//! Schema snapshots.
//!
//! A [`SchemaSnapshot`] reads a database's catalog once and returns plain
//! [`SchemaMetadata`]. One implementation exists per supported database, in
//! the driver crates; everything downstream is database-agnostic.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodegenError, CodegenResult};

/// Database family a snapshot was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// PostgreSQL.
    #[serde(alias = "postgres")]
    Postgresql,
    /// SQLite.
    Sqlite,
    /// MySQL / MariaDB.
    Mysql,
}

impl DatabaseKind {
    /// Lowercase name of the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::Mysql),
            other => Err(CodegenError::config(format!("unknown database driver '{}'", other))),
        }
    }
}

/// Options controlling what a snapshot reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Whether views are read alongside tables.
    pub include_views: bool,
    /// Schema to read (PostgreSQL); `None` uses the driver default.
    pub schema: Option<String>,
}

/// Point-in-time read of a database's tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// Schema the tables were read from.
    pub schema: Option<String>,
    /// Tables by name.
    pub tables: BTreeMap<String, TableMetadata>,
}

impl SchemaMetadata {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table with the same name.
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Look up a table.
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(name)
    }
}

/// Raw metadata of one table or view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name.
    pub name: String,
    /// Whether this is a view.
    pub is_view: bool,
    /// Columns in declaration order.
    pub columns: Vec<ColumnMetadata>,
    /// Primary-key column names in key order.
    pub primary_key: Vec<String>,
    /// Outgoing foreign keys, one entry per column.
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    /// Indexes, excluding the one backing the primary key.
    pub indexes: Vec<IndexMetadata>,
}

impl TableMetadata {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a column.
    pub fn column(mut self, column: ColumnMetadata) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key.
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a foreign key.
    pub fn foreign_key(
        mut self,
        column: impl Into<String>,
        dest_table: impl Into<String>,
        dest_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKeyMetadata {
            column: column.into(),
            dest_table: dest_table.into(),
            dest_column: dest_column.into(),
        });
        self
    }

    /// Add an index.
    pub fn index<I, S>(mut self, name: impl Into<String>, columns: I, unique: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.push(IndexMetadata {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
        });
        self
    }

    /// Look up a column.
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Raw metadata of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Declared SQL type, as reported by the catalog.
    pub data_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value expression.
    pub default: Option<String>,
    /// Character maximum length.
    pub max_length: Option<u32>,
    /// Whether the database generates values (serial, identity, rowid alias).
    pub auto_increment: bool,
}

impl ColumnMetadata {
    /// Create a NOT NULL column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    /// Allow NULL.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as database-generated.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Set a default expression.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the maximum length.
    pub fn max_length(mut self, length: u32) -> Self {
        self.max_length = Some(length);
        self
    }
}

/// A single-column foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    /// Local column.
    pub column: String,
    /// Referenced table.
    pub dest_table: String,
    /// Referenced column.
    pub dest_column: String,
}

/// An index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Index name.
    pub name: String,
    /// Indexed columns in order.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// Source of schema metadata.
pub trait SchemaSnapshot {
    /// Database family of this source.
    fn database_kind(&self) -> DatabaseKind;

    /// Read the schema.
    fn snapshot(&mut self, options: &SnapshotOptions) -> CodegenResult<SchemaMetadata>;
}

impl<T: SchemaSnapshot + ?Sized> SchemaSnapshot for &mut T {
    fn database_kind(&self) -> DatabaseKind {
        (**self).database_kind()
    }

    fn snapshot(&mut self, options: &SnapshotOptions) -> CodegenResult<SchemaMetadata> {
        (**self).snapshot(options)
    }
}

/// A snapshot that was read ahead of time.
#[derive(Debug, Clone)]
pub struct StaticSnapshot {
    kind: DatabaseKind,
    metadata: SchemaMetadata,
}

impl StaticSnapshot {
    /// Wrap pre-read metadata.
    pub fn new(kind: DatabaseKind, metadata: SchemaMetadata) -> Self {
        Self { kind, metadata }
    }
}

impl SchemaSnapshot for StaticSnapshot {
    fn database_kind(&self) -> DatabaseKind {
        self.kind
    }

    fn snapshot(&mut self, options: &SnapshotOptions) -> CodegenResult<SchemaMetadata> {
        let mut metadata = self.metadata.clone();
        if !options.include_views {
            metadata.tables.retain(|_, table| !table.is_view);
        }
        Ok(metadata)
    }
}
