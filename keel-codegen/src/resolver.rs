//! Foreign-key aware table ordering.
//!
//! Tables are visited in name order. Before a table is emitted, every table
//! it references is resolved first, so the output never places a model
//! before a model it points to (self-references excepted). Reference cycles
//! and references to filtered-out tables are hard errors.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::ResolutionError;
use crate::filter::TableFilter;
use crate::introspect::{ColumnDescriptor, DatabaseMetadata};

/// A table whose dependencies have all been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    /// Table name.
    pub table_name: String,
    /// Model name.
    pub model_name: String,
    /// Schema the table lives in.
    pub schema: Option<String>,
    /// Columns after the composite-key rule.
    pub columns: Vec<ColumnDescriptor>,
    /// Sorted field names of the primary-key columns.
    pub primary_keys: Vec<String>,
    /// Sorted multi-column indexes as `(fields, unique)`.
    pub indexes: Vec<(Vec<String>, bool)>,
}

impl ResolvedTable {
    /// Whether the table has a multi-column primary key.
    pub fn has_composite_key(&self) -> bool {
        self.primary_keys.len() > 1
    }
}

/// Orders tables by foreign-key dependency.
pub struct Resolver<'a> {
    metadata: &'a DatabaseMetadata,
    filter: &'a TableFilter,
    resolved: HashSet<String>,
    output: Vec<ResolvedTable>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over introspected metadata.
    pub fn new(metadata: &'a DatabaseMetadata, filter: &'a TableFilter) -> Self {
        Self {
            metadata,
            filter,
            resolved: HashSet::new(),
            output: Vec::new(),
        }
    }

    /// Resolve every table, returning them in emission order.
    pub fn resolve(mut self) -> Result<Vec<ResolvedTable>, ResolutionError> {
        let metadata = self.metadata;
        for table in metadata.table_names() {
            self.visit(table, &mut Vec::new())?;
        }
        debug!(tables = self.output.len(), "resolved tables");
        Ok(self.output)
    }

    fn visit(&mut self, table: &str, path: &mut Vec<String>) -> Result<(), ResolutionError> {
        if self.resolved.contains(table) {
            return Ok(());
        }

        if self.filter.is_skipped(table) {
            return match path.last() {
                Some(required_by) => Err(ResolutionError::RequiredTableExcluded {
                    table: table.to_string(),
                    required_by: required_by.clone(),
                }),
                None => {
                    trace!(table, "table filtered out");
                    Ok(())
                }
            };
        }

        let metadata = self.metadata;
        let foreign_keys = metadata
            .foreign_keys
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for fk in foreign_keys {
            let dest = fk.dest_table.as_str();
            if dest == table {
                continue;
            }
            if path.iter().any(|p| p == dest) {
                let mut cycle = path.clone();
                cycle.push(table.to_string());
                return Err(ResolutionError::CycleDetected {
                    table: dest.to_string(),
                    path: cycle,
                });
            }
            if !metadata.contains(dest) {
                return Err(ResolutionError::UnknownTable {
                    table: dest.to_string(),
                    referenced_by: table.to_string(),
                });
            }
            if !self.resolved.contains(dest) {
                path.push(table.to_string());
                let result = self.visit(dest, path);
                path.pop();
                result?;
            }
        }

        let resolved = self.materialize(table);
        self.resolved.insert(table.to_string());
        self.output.push(resolved);
        Ok(())
    }

    fn materialize(&self, table: &str) -> ResolvedTable {
        let metadata = self.metadata;
        let primary_key = metadata
            .primary_keys
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let composite = primary_key.len() > 1;

        let columns: Vec<ColumnDescriptor> = metadata
            .columns
            .get(table)
            .into_iter()
            .flat_map(|cols| cols.values())
            .filter(|col| {
                !(composite
                    && col.column_name == "id"
                    && col.primary_key
                    && col.field_type.is_integer())
            })
            .cloned()
            .map(|mut col| {
                if composite {
                    col.primary_key = false;
                }
                col
            })
            .collect();

        let mut primary_keys: Vec<String> = metadata
            .columns
            .get(table)
            .into_iter()
            .flat_map(|cols| cols.values())
            .filter(|col| primary_key.contains(&col.column_name))
            .map(|col| col.name.clone())
            .collect();
        primary_keys.sort();

        let mut indexes = metadata.multi_column_indexes(table);
        indexes.sort();

        ResolvedTable {
            table_name: table.to_string(),
            model_name: metadata
                .model_names
                .get(table)
                .cloned()
                .unwrap_or_default(),
            schema: metadata.schema.clone(),
            columns,
            primary_keys,
            indexes,
        }
    }
}

/// Resolve all tables of `metadata` under `filter`.
pub fn resolve(
    metadata: &DatabaseMetadata,
    filter: &TableFilter,
) -> Result<Vec<ResolvedTable>, ResolutionError> {
    Resolver::new(metadata, filter).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::introspect::Introspector;
    use crate::snapshot::{ColumnMetadata, DatabaseKind, SchemaMetadata, TableMetadata};

    fn table(name: &str, refs: &[&str]) -> TableMetadata {
        let mut table = TableMetadata::new(name)
            .column(ColumnMetadata::new("id", "INTEGER").auto_increment())
            .primary_key(["id"]);
        for dest in refs {
            let column = format!("{}_id", dest);
            table = table
                .column(ColumnMetadata::new(column.clone(), "INTEGER"))
                .foreign_key(column, *dest, "id");
        }
        table
    }

    fn metadata(tables: Vec<TableMetadata>) -> DatabaseMetadata {
        let schema = tables
            .into_iter()
            .fold(SchemaMetadata::new(), |schema, t| schema.with_table(t));
        Introspector::new(DatabaseKind::Sqlite).introspect(&schema)
    }

    fn order(tables: &[ResolvedTable]) -> Vec<&str> {
        tables.iter().map(|t| t.table_name.as_str()).collect()
    }

    #[test]
    fn test_dependencies_first() {
        let metadata = metadata(vec![
            table("comments", &["posts", "users"]),
            table("posts", &["users"]),
            table("users", &[]),
        ]);
        let resolved = resolve(&metadata, &TableFilter::allow_all()).unwrap();
        assert_eq!(order(&resolved), vec!["users", "posts", "comments"]);
    }

    #[test]
    fn test_self_reference_allowed() {
        let metadata = metadata(vec![table("categories", &["categories"])]);
        let resolved = resolve(&metadata, &TableFilter::allow_all()).unwrap();
        assert_eq!(order(&resolved), vec!["categories"]);
    }

    #[test]
    fn test_cycle_rejected() {
        let metadata = metadata(vec![table("a", &["b"]), table("b", &["a"])]);
        let err = resolve(&metadata, &TableFilter::allow_all()).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::CycleDetected {
                table: "a".to_string(),
                path: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_longer_cycle_rejected() {
        let metadata = metadata(vec![
            table("a", &["b"]),
            table("b", &["c"]),
            table("c", &["a"]),
        ]);
        let err = resolve(&metadata, &TableFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ResolutionError::CycleDetected { .. }));
    }

    #[test]
    fn test_excluded_dependency_fails() {
        let metadata = metadata(vec![table("posts", &["users"]), table("users", &[])]);
        let filter = TableFilter::new(Vec::<String>::new(), ["users"]).unwrap();
        let err = resolve(&metadata, &filter).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::RequiredTableExcluded {
                table: "users".to_string(),
                required_by: "posts".to_string(),
            }
        );
    }

    #[test]
    fn test_excluded_top_level_is_skipped() {
        let metadata = metadata(vec![table("posts", &["users"]), table("users", &[]), table("logs", &[])]);
        let filter = TableFilter::new(Vec::<String>::new(), ["/^log/"]).unwrap();
        let resolved = resolve(&metadata, &filter).unwrap();
        assert_eq!(order(&resolved), vec!["users", "posts"]);
    }

    #[test]
    fn test_include_whitelist_still_requires_dependencies() {
        let metadata = metadata(vec![table("posts", &["users"]), table("users", &[])]);
        let filter = TableFilter::new(["posts"], Vec::<String>::new()).unwrap();
        let err = resolve(&metadata, &filter).unwrap_err();
        assert!(matches!(err, ResolutionError::RequiredTableExcluded { .. }));
    }

    #[test]
    fn test_unknown_reference() {
        let metadata = metadata(vec![table("posts", &["ghosts"])]);
        let err = resolve(&metadata, &TableFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ResolutionError::UnknownTable { .. }));
    }

    #[test]
    fn test_composite_key_drops_surrogate_id() {
        let links = TableMetadata::new("post_tags")
            .column(ColumnMetadata::new("id", "INTEGER").auto_increment())
            .column(ColumnMetadata::new("post_id", "INTEGER"))
            .column(ColumnMetadata::new("tag_id", "INTEGER"))
            .primary_key(["id", "post_id"])
            .index("post_tags_pair", ["tag_id", "post_id"], true);
        let metadata = metadata(vec![links]);

        let resolved = resolve(&metadata, &TableFilter::allow_all()).unwrap();
        let table = &resolved[0];
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["post_id", "tag_id"]);
        assert!(table.columns.iter().all(|c| !c.primary_key));
        assert_eq!(table.primary_keys, vec!["id", "post_id"]);
        assert!(table.has_composite_key());
        assert_eq!(
            table.indexes,
            vec![(vec!["tag_id".to_string(), "post_id".to_string()], true)]
        );
    }

    #[test]
    fn test_composite_key_drops_plain_integer_id() {
        let members = TableMetadata::new("memberships")
            .column(ColumnMetadata::new("id", "INTEGER"))
            .column(ColumnMetadata::new("group_id", "INTEGER"))
            .column(ColumnMetadata::new("role", "TEXT"))
            .primary_key(["id", "group_id"]);
        let metadata = metadata(vec![members]);

        let resolved = resolve(&metadata, &TableFilter::allow_all()).unwrap();
        let names: Vec<&str> = resolved[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["group_id", "role"]);
        assert_eq!(resolved[0].primary_keys, vec!["group_id", "id"]);
    }

    #[test]
    fn test_composite_key_keeps_text_id() {
        let codes = TableMetadata::new("codes")
            .column(ColumnMetadata::new("id", "TEXT"))
            .column(ColumnMetadata::new("scope", "TEXT"))
            .primary_key(["id", "scope"]);
        let metadata = metadata(vec![codes]);

        let resolved = resolve(&metadata, &TableFilter::allow_all()).unwrap();
        let names: Vec<&str> = resolved[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "scope"]);
    }
}
