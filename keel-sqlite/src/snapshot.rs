//! Schema snapshots read from the SQLite catalog.

use keel_codegen::types::declared_length;
use keel_codegen::{
    CodegenResult, ColumnMetadata, DatabaseKind, ForeignKeyMetadata, IndexMetadata,
    SchemaMetadata, SchemaSnapshot, SnapshotOptions, TableMetadata,
};
use rusqlite::params;
use tracing::{debug, trace};

use crate::connection::SqliteDatabase;
use crate::error::{SqliteError, SqliteResult};

/// A row of `pragma_table_info`.
struct ColumnRow {
    name: String,
    data_type: String,
    not_null: bool,
    default: Option<String>,
    pk_position: i64,
}

impl SqliteDatabase {
    fn table_names(&self, schema: &str, include_views: bool) -> SqliteResult<Vec<(String, bool)>> {
        let sql = format!(
            "SELECT name, type FROM \"{}\".sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            schema
        );
        let mut stmt = self.inner().prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)? == "view"))
        })?;

        let mut names = Vec::new();
        for row in rows {
            let (name, is_view) = row?;
            if is_view && !include_views {
                continue;
            }
            names.push((name, is_view));
        }
        Ok(names)
    }

    fn column_rows(&self, schema: &str, table: &str) -> SqliteResult<Vec<ColumnRow>> {
        let mut stmt = self.inner().prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info(?1, ?2) ORDER BY cid",
        )?;
        let rows = stmt.query_map(params![table, schema], |row| {
            Ok(ColumnRow {
                name: row.get(0)?,
                data_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default: row.get(3)?,
                pk_position: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn primary_key_of(&self, schema: &str, table: &str) -> SqliteResult<Vec<String>> {
        let mut pk: Vec<(i64, String)> = self
            .column_rows(schema, table)?
            .into_iter()
            .filter(|c| c.pk_position > 0)
            .map(|c| (c.pk_position, c.name))
            .collect();
        pk.sort();
        Ok(pk.into_iter().map(|(_, name)| name).collect())
    }

    fn foreign_keys(&self, schema: &str, table: &str) -> SqliteResult<Vec<ForeignKeyMetadata>> {
        let mut stmt = self.inner().prepare(
            "SELECT \"table\", \"from\", \"to\" \
             FROM pragma_foreign_key_list(?1, ?2) ORDER BY id, seq",
        )?;
        let rows = stmt.query_map(params![table, schema], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut keys = Vec::new();
        for row in rows {
            let (dest_table, column, dest_column) = row?;
            // A reference without a column list targets the primary key.
            let dest_column = match dest_column {
                Some(dest_column) => dest_column,
                None => self
                    .primary_key_of(schema, &dest_table)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        SqliteError::introspection(format!(
                            "foreign key {}.{} references '{}' which has no primary key",
                            table, column, dest_table
                        ))
                    })?,
            };
            keys.push(ForeignKeyMetadata {
                column,
                dest_table,
                dest_column,
            });
        }
        Ok(keys)
    }

    fn indexes(&self, schema: &str, table: &str) -> SqliteResult<Vec<IndexMetadata>> {
        let mut stmt = self.inner().prepare(
            "SELECT name, \"unique\", origin FROM pragma_index_list(?1, ?2) ORDER BY name",
        )?;
        let listed = stmt
            .query_map(params![table, schema], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? != 0,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut info = self.inner().prepare(
            "SELECT name FROM pragma_index_info(?1, ?2) ORDER BY seqno",
        )?;
        let mut indexes = Vec::new();
        for (name, unique, origin) in listed {
            if origin == "pk" {
                continue;
            }
            let columns = info
                .query_map(params![name, schema], |row| row.get::<_, Option<String>>(0))?
                .collect::<Result<Option<Vec<_>>, _>>()?;
            // Expression indexes have no column names.
            let Some(columns) = columns else {
                trace!(index = %name, "skipping expression index");
                continue;
            };
            indexes.push(IndexMetadata {
                name,
                columns,
                unique,
            });
        }
        Ok(indexes)
    }

    fn table_metadata(&self, schema: &str, name: &str, is_view: bool) -> SqliteResult<TableMetadata> {
        let rows = self.column_rows(schema, name)?;
        let pk_count = rows.iter().filter(|c| c.pk_position > 0).count();

        let mut table = TableMetadata::new(name);
        table.is_view = is_view;
        let mut pk: Vec<(i64, String)> = Vec::new();

        for row in rows {
            let mut column = ColumnMetadata::new(&row.name, &row.data_type);
            column.nullable = !row.not_null;
            column.default = row.default;
            column.max_length = declared_length(&row.data_type);
            // INTEGER PRIMARY KEY aliases the rowid.
            if row.pk_position > 0 {
                if pk_count == 1 && row.data_type.eq_ignore_ascii_case("integer") {
                    column.auto_increment = true;
                }
                pk.push((row.pk_position, row.name));
            }
            table.columns.push(column);
        }

        pk.sort();
        table.primary_key = pk.into_iter().map(|(_, name)| name).collect();

        if !is_view {
            table.foreign_keys = self.foreign_keys(schema, name)?;
            table.indexes = self.indexes(schema, name)?;
        }
        Ok(table)
    }

    /// Read every table (and optionally view) from the catalog.
    pub fn read_schema(&self, options: &SnapshotOptions) -> SqliteResult<SchemaMetadata> {
        let schema = options.schema.as_deref().unwrap_or("main");
        let mut metadata = SchemaMetadata::new();
        metadata.schema = options.schema.clone();

        for (name, is_view) in self.table_names(schema, options.include_views)? {
            let table = self.table_metadata(schema, &name, is_view)?;
            trace!(
                table = %name,
                columns = table.columns.len(),
                foreign_keys = table.foreign_keys.len(),
                "read table"
            );
            metadata.tables.insert(name, table);
        }

        debug!(schema, tables = metadata.tables.len(), "read sqlite catalog");
        Ok(metadata)
    }
}

impl SchemaSnapshot for SqliteDatabase {
    fn database_kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn snapshot(&mut self, options: &SnapshotOptions) -> CodegenResult<SchemaMetadata> {
        Ok(self.read_schema(options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_migrate::Connection;
    use pretty_assertions::assert_eq;

    fn database() -> SqliteDatabase {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        db.execute(
            "CREATE TABLE users (
                 id INTEGER PRIMARY KEY,
                 email VARCHAR(120) NOT NULL UNIQUE,
                 nickname TEXT DEFAULT 'anon'
             );
             CREATE TABLE posts (
                 id INTEGER PRIMARY KEY,
                 author INTEGER NOT NULL REFERENCES users,
                 title TEXT,
                 slug TEXT
             );
             CREATE UNIQUE INDEX posts_title_slug ON posts (title, slug);
             CREATE INDEX posts_lower_title ON posts (lower(title));
             CREATE TABLE tags (post_id INTEGER REFERENCES posts(id), name TEXT, PRIMARY KEY (name, post_id));
             CREATE VIEW recent AS SELECT id, title FROM posts;",
        )
        .unwrap();
        db
    }

    #[test]
    fn test_snapshot_tables() {
        let mut db = database();
        let schema = db.snapshot(&SnapshotOptions::default()).unwrap();
        assert_eq!(
            schema.tables.keys().collect::<Vec<_>>(),
            vec!["posts", "tags", "users"]
        );

        let users = schema.table("users").unwrap();
        assert_eq!(users.primary_key, vec!["id"]);
        assert!(users.get_column("id").unwrap().auto_increment);

        let email = users.get_column("email").unwrap();
        assert!(!email.nullable);
        assert_eq!(email.max_length, Some(120));
        assert_eq!(users.get_column("nickname").unwrap().default.as_deref(), Some("'anon'"));
        assert!(users.indexes.iter().any(|i| i.columns == vec!["email"] && i.unique));
    }

    #[test]
    fn test_snapshot_foreign_keys_default_to_primary_key() {
        let mut db = database();
        let schema = db.snapshot(&SnapshotOptions::default()).unwrap();
        let posts = schema.table("posts").unwrap();
        assert_eq!(
            posts.foreign_keys,
            vec![ForeignKeyMetadata {
                column: "author".to_string(),
                dest_table: "users".to_string(),
                dest_column: "id".to_string(),
            }]
        );
    }

    #[test]
    fn test_snapshot_indexes_skip_expressions() {
        let mut db = database();
        let schema = db.snapshot(&SnapshotOptions::default()).unwrap();
        let posts = schema.table("posts").unwrap();
        assert_eq!(posts.indexes.len(), 1);
        assert_eq!(posts.indexes[0].columns, vec!["title", "slug"]);
        assert!(posts.indexes[0].unique);
    }

    #[test]
    fn test_snapshot_composite_primary_key() {
        let mut db = database();
        let schema = db.snapshot(&SnapshotOptions::default()).unwrap();
        let tags = schema.table("tags").unwrap();
        assert_eq!(tags.primary_key, vec!["name", "post_id"]);
        assert!(!tags.get_column("post_id").unwrap().auto_increment);
    }

    #[test]
    fn test_snapshot_views() {
        let mut db = database();
        let options = SnapshotOptions {
            include_views: true,
            ..Default::default()
        };
        let schema = db.snapshot(&options).unwrap();
        let recent = schema.table("recent").unwrap();
        assert!(recent.is_view);
        assert_eq!(recent.columns.len(), 2);
    }
}
