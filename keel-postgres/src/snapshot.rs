//! Schema snapshots read from `information_schema` and `pg_catalog`.
//!
//! Each catalog query returns rows for the whole schema at once; the rows
//! are then grouped by table in [`assemble`].

use std::collections::BTreeMap;

use keel_codegen::{
    CodegenResult, ColumnMetadata, DatabaseKind, ForeignKeyMetadata, IndexMetadata,
    SchemaMetadata, SchemaSnapshot, SnapshotOptions, TableMetadata,
};
use tracing::debug;

use crate::connection::PostgresDatabase;
use crate::error::PgResult;

/// Catalog queries, parameterized by schema name (`$1`).
pub mod queries {
    /// Tables and views.
    pub const TABLES: &str = "\
        SELECT table_name::text, table_type::text = 'VIEW' \
        FROM information_schema.tables \
        WHERE table_schema::text = $1 AND table_type::text IN ('BASE TABLE', 'VIEW') \
        ORDER BY table_name";

    /// Columns in declaration order.
    pub const COLUMNS: &str = "\
        SELECT c.table_name::text, c.column_name::text, c.udt_name::text, \
               c.is_nullable::text = 'YES', c.column_default::text, \
               c.character_maximum_length::int4, \
               COALESCE(c.column_default::text LIKE 'nextval%', false) OR c.is_identity::text = 'YES' \
        FROM information_schema.columns c \
        WHERE c.table_schema::text = $1 \
        ORDER BY c.table_name, c.ordinal_position";

    /// Primary-key columns in key order.
    pub const PRIMARY_KEYS: &str = "\
        SELECT c.relname::text, a.attname::text \
        FROM pg_index i \
        JOIN pg_class c ON c.oid = i.indrelid \
        JOIN pg_namespace n ON n.oid = c.relnamespace \
        JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
        WHERE i.indisprimary AND n.nspname::text = $1 \
        ORDER BY c.relname, array_position(i.indkey::int2[], a.attnum)";

    /// Foreign-key column pairs.
    pub const FOREIGN_KEYS: &str = "\
        SELECT src.relname::text, sa.attname::text, dst.relname::text, da.attname::text \
        FROM pg_constraint con \
        JOIN pg_class src ON src.oid = con.conrelid \
        JOIN pg_namespace n ON n.oid = src.relnamespace \
        JOIN pg_class dst ON dst.oid = con.confrelid \
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_attnum, dst_attnum, ord) \
        JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_attnum \
        JOIN pg_attribute da ON da.attrelid = con.confrelid AND da.attnum = k.dst_attnum \
        WHERE con.contype = 'f' AND n.nspname::text = $1 \
        ORDER BY src.relname, con.conname, k.ord";

    /// Secondary index columns, excluding expression indexes.
    pub const INDEXES: &str = "\
        SELECT t.relname::text, ic.relname::text, i.indisunique, a.attname::text \
        FROM pg_index i \
        JOIN pg_class t ON t.oid = i.indrelid \
        JOIN pg_class ic ON ic.oid = i.indexrelid \
        JOIN pg_namespace n ON n.oid = t.relnamespace \
        CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) \
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
        WHERE n.nspname::text = $1 AND NOT i.indisprimary AND i.indexprs IS NULL \
        ORDER BY t.relname, ic.relname, k.ord";
}

/// A row of [`queries::COLUMNS`].
#[derive(Debug, Clone)]
pub struct ColumnRow {
    pub table: String,
    pub name: String,
    pub udt_name: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub max_length: Option<i32>,
    pub auto_increment: bool,
}

/// Raw catalog rows for one schema.
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    /// `(table, is_view)`.
    pub tables: Vec<(String, bool)>,
    pub columns: Vec<ColumnRow>,
    /// `(table, column)`.
    pub primary_keys: Vec<(String, String)>,
    /// `(table, column, dest_table, dest_column)`.
    pub foreign_keys: Vec<(String, String, String, String)>,
    /// `(table, index, unique, column)`.
    pub indexes: Vec<(String, String, bool, String)>,
}

/// Group catalog rows into table metadata.
///
/// Rows for tables not listed in `rows.tables` (for example views left out
/// of the snapshot) are ignored.
pub fn assemble(schema: &str, rows: CatalogRows) -> SchemaMetadata {
    let mut tables: BTreeMap<String, TableMetadata> = rows
        .tables
        .into_iter()
        .map(|(name, is_view)| {
            let mut table = TableMetadata::new(&name);
            table.is_view = is_view;
            (name, table)
        })
        .collect();

    for row in rows.columns {
        let Some(table) = tables.get_mut(&row.table) else {
            continue;
        };
        let mut column = ColumnMetadata::new(row.name, row.udt_name);
        column.nullable = row.nullable;
        column.default = row.default;
        column.max_length = row.max_length.and_then(|l| u32::try_from(l).ok());
        column.auto_increment = row.auto_increment;
        table.columns.push(column);
    }

    for (table, column) in rows.primary_keys {
        if let Some(table) = tables.get_mut(&table) {
            table.primary_key.push(column);
        }
    }

    for (table, column, dest_table, dest_column) in rows.foreign_keys {
        if let Some(table) = tables.get_mut(&table) {
            table.foreign_keys.push(ForeignKeyMetadata {
                column,
                dest_table,
                dest_column,
            });
        }
    }

    for (table, index, unique, column) in rows.indexes {
        let Some(table) = tables.get_mut(&table) else {
            continue;
        };
        match table.indexes.iter_mut().find(|i| i.name == index) {
            Some(existing) => existing.columns.push(column),
            None => table.indexes.push(IndexMetadata {
                name: index,
                columns: vec![column],
                unique,
            }),
        }
    }

    SchemaMetadata {
        schema: Some(schema.to_string()),
        tables,
    }
}

impl PostgresDatabase {
    fn catalog_rows(&mut self, schema: &str, include_views: bool) -> PgResult<CatalogRows> {
        let client = self.client();
        let mut rows = CatalogRows::default();

        for row in client.query(queries::TABLES, &[&schema])? {
            let is_view: bool = row.try_get(1)?;
            if is_view && !include_views {
                continue;
            }
            rows.tables.push((row.try_get(0)?, is_view));
        }

        for row in client.query(queries::COLUMNS, &[&schema])? {
            rows.columns.push(ColumnRow {
                table: row.try_get(0)?,
                name: row.try_get(1)?,
                udt_name: row.try_get(2)?,
                nullable: row.try_get(3)?,
                default: row.try_get(4)?,
                max_length: row.try_get(5)?,
                auto_increment: row.try_get(6)?,
            });
        }

        for row in client.query(queries::PRIMARY_KEYS, &[&schema])? {
            rows.primary_keys.push((row.try_get(0)?, row.try_get(1)?));
        }

        for row in client.query(queries::FOREIGN_KEYS, &[&schema])? {
            rows.foreign_keys.push((
                row.try_get(0)?,
                row.try_get(1)?,
                row.try_get(2)?,
                row.try_get(3)?,
            ));
        }

        for row in client.query(queries::INDEXES, &[&schema])? {
            rows.indexes.push((
                row.try_get(0)?,
                row.try_get(1)?,
                row.try_get(2)?,
                row.try_get(3)?,
            ));
        }

        Ok(rows)
    }

    /// Read every table (and optionally view) of a schema.
    pub fn read_schema(&mut self, options: &SnapshotOptions) -> PgResult<SchemaMetadata> {
        let schema = options
            .schema
            .clone()
            .unwrap_or_else(|| self.schema().to_string());
        let rows = self.catalog_rows(&schema, options.include_views)?;
        let metadata = assemble(&schema, rows);
        debug!(schema = %schema, tables = metadata.tables.len(), "read postgres catalog");
        Ok(metadata)
    }
}

impl SchemaSnapshot for PostgresDatabase {
    fn database_kind(&self) -> DatabaseKind {
        DatabaseKind::Postgresql
    }

    fn snapshot(&mut self, options: &SnapshotOptions) -> CodegenResult<SchemaMetadata> {
        Ok(self.read_schema(options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(table: &str, name: &str, udt: &str) -> ColumnRow {
        ColumnRow {
            table: table.to_string(),
            name: name.to_string(),
            udt_name: udt.to_string(),
            nullable: false,
            default: None,
            max_length: None,
            auto_increment: false,
        }
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    fn rows() -> CatalogRows {
        let mut id = column("users", "id", "int4");
        id.auto_increment = true;
        id.default = Some(s("nextval('users_id_seq'::regclass)"));
        let mut email = column("users", "email", "varchar");
        email.max_length = Some(200);

        CatalogRows {
            tables: vec![(s("posts"), false), (s("users"), false)],
            columns: vec![
                column("posts", "id", "int8"),
                column("posts", "user_id", "int4"),
                column("posts", "title", "text"),
                column("posts", "slug", "text"),
                id,
                email,
                column("active_users", "id", "int4"),
            ],
            primary_keys: vec![(s("posts"), s("id")), (s("users"), s("id"))],
            foreign_keys: vec![(s("posts"), s("user_id"), s("users"), s("id"))],
            indexes: vec![
                (s("posts"), s("posts_title_slug"), true, s("title")),
                (s("posts"), s("posts_title_slug"), true, s("slug")),
                (s("users"), s("users_email_key"), true, s("email")),
            ],
        }
    }

    #[test]
    fn test_assemble_groups_rows_by_table() {
        let schema = assemble("public", rows());
        assert_eq!(schema.schema.as_deref(), Some("public"));
        assert_eq!(schema.tables.keys().collect::<Vec<_>>(), vec!["posts", "users"]);

        let users = schema.table("users").unwrap();
        assert_eq!(users.primary_key, vec!["id"]);
        assert!(users.get_column("id").unwrap().auto_increment);
        assert_eq!(users.get_column("email").unwrap().max_length, Some(200));

        let posts = schema.table("posts").unwrap();
        assert_eq!(posts.columns.len(), 4);
        assert_eq!(posts.foreign_keys[0].dest_table, "users");
    }

    #[test]
    fn test_assemble_merges_index_columns() {
        let schema = assemble("public", rows());
        let posts = schema.table("posts").unwrap();
        assert_eq!(
            posts.indexes,
            vec![IndexMetadata {
                name: s("posts_title_slug"),
                columns: vec![s("title"), s("slug")],
                unique: true,
            }]
        );
    }

    #[test]
    fn test_assemble_ignores_unlisted_tables() {
        let schema = assemble("public", rows());
        assert!(schema.table("active_users").is_none());
    }

    #[test]
    fn test_queries_are_schema_parameterized() {
        for query in [
            queries::TABLES,
            queries::COLUMNS,
            queries::PRIMARY_KEYS,
            queries::FOREIGN_KEYS,
            queries::INDEXES,
        ] {
            assert!(query.contains("$1"), "{query}");
        }
    }
}
