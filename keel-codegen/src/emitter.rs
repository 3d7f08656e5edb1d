//! Model emission: resolved tables to renderer input.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::resolver::ResolvedTable;
use crate::snapshot::DatabaseKind;

/// A model field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Field identifier.
    pub name: String,
    /// Rust type of the field.
    pub field_type: String,
    /// Literal parameters for the renderer.
    pub params: IndexMap<String, Value>,
}

/// A multi-column index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    /// Field names in index order.
    pub fields: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// A model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Model type name.
    pub model_name: String,
    /// Table name in the database.
    pub table_name: String,
    /// Fields in column order.
    pub columns: Vec<Column>,
    /// Multi-column indexes.
    pub indexes: Vec<Index>,
    /// Schema the table lives in, when not the default.
    pub schema: Option<String>,
    /// Sorted primary-key field names.
    pub primary_keys: Vec<String>,
}

/// Everything a renderer needs to produce model source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateData {
    /// Database the models were generated from.
    pub database: DatabaseKind,
    /// Type names to import, grouped by module path.
    pub imports: BTreeMap<String, BTreeSet<String>>,
    /// Models by model name, in dependency order.
    pub tables: IndexMap<String, Table>,
}

/// Map resolved tables to template data.
///
/// `model_names` maps table names to model names for foreign-key parameters.
pub fn emit(
    database: DatabaseKind,
    resolved: &[ResolvedTable],
    model_names: &BTreeMap<String, String>,
) -> TemplateData {
    let mut imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut tables = IndexMap::new();

    for table in resolved {
        let columns = table
            .columns
            .iter()
            .map(|col| {
                for (module, name) in col.field_type.imports() {
                    imports.entry(module).or_default().insert(name);
                }
                Column {
                    name: col.name.clone(),
                    field_type: col.rust_type(),
                    params: col.field_parameters(model_names),
                }
            })
            .collect();

        let indexes = table
            .indexes
            .iter()
            .map(|(fields, unique)| Index {
                fields: fields.clone(),
                unique: *unique,
            })
            .collect();

        tables.insert(
            table.model_name.clone(),
            Table {
                model_name: table.model_name.clone(),
                table_name: table.table_name.clone(),
                columns,
                indexes,
                schema: table.schema.clone(),
                primary_keys: table.primary_keys.clone(),
            },
        );
    }

    TemplateData {
        database,
        imports,
        tables,
    }
}
