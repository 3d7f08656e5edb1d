//! Turns a raw [`SchemaMetadata`] into per-column field descriptors.
//!
//! This is where naming conventions apply: model names, field names, custom
//! column types and the field-parameter map each column carries to the
//! renderer.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::snapshot::{DatabaseKind, ForeignKeyMetadata, IndexMetadata, SchemaMetadata};
use crate::types::{self, FieldType};

/// Target of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// Everything known about one column after naming rules have been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    /// Field identifier in generated code.
    pub name: String,
    /// Column name in the database.
    pub column_name: String,
    /// Declared SQL type.
    pub sql_type: String,
    /// Normalized field type.
    pub field_type: FieldType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the column is (part of) the primary key.
    pub primary_key: bool,
    /// Whether the database generates values.
    pub auto_increment: bool,
    /// Covered by a single-column unique index.
    pub unique: bool,
    /// Covered by a single-column non-unique index.
    pub index: bool,
    /// Default value expression.
    pub default: Option<String>,
    /// Character maximum length.
    pub max_length: Option<u32>,
    /// Foreign-key target.
    pub references: Option<Reference>,
}

impl ColumnDescriptor {
    /// Rust type of the field, wrapped in `Option` when nullable.
    pub fn rust_type(&self) -> String {
        types::apply_nullability(self.field_type.rust_type(), self.nullable)
    }

    /// Literal parameters for the renderer.
    ///
    /// `model_names` resolves the model a foreign key points to.
    pub fn field_parameters(&self, model_names: &BTreeMap<String, String>) -> IndexMap<String, Value> {
        let mut params = IndexMap::new();
        let bare_name = self.name.strip_prefix("r#").unwrap_or(&self.name);
        if bare_name != self.column_name {
            params.insert("column_name".to_string(), Value::from(self.column_name.clone()));
        }
        if self.primary_key {
            params.insert("primary_key".to_string(), Value::Bool(true));
        }
        if self.nullable {
            params.insert("null".to_string(), Value::Bool(true));
        }
        if self.unique {
            params.insert("unique".to_string(), Value::Bool(true));
        } else if self.index {
            params.insert("index".to_string(), Value::Bool(true));
        }
        if let Some(default) = &self.default {
            params.insert("default".to_string(), Value::from(default.clone()));
        }
        if let Some(length) = self.max_length {
            params.insert("max_length".to_string(), Value::from(length));
        }
        if let Some(reference) = &self.references {
            let model = model_names
                .get(&reference.table)
                .cloned()
                .unwrap_or_else(|| types::model_name(&reference.table));
            params.insert("references".to_string(), Value::from(model));
            params.insert("to_field".to_string(), Value::from(reference.column.clone()));
        }
        if let FieldType::Unknown(sql_type) = &self.field_type {
            params.insert("sql_type".to_string(), Value::from(sql_type.clone()));
        }
        params
    }
}

/// Descriptors for every table in a snapshot.
#[derive(Debug, Clone, Default)]
pub struct DatabaseMetadata {
    /// Schema the tables were read from.
    pub schema: Option<String>,
    /// Model name by table name.
    pub model_names: BTreeMap<String, String>,
    /// Column descriptors by table, keyed by column name in declaration order.
    pub columns: BTreeMap<String, IndexMap<String, ColumnDescriptor>>,
    /// Primary-key column names by table.
    pub primary_keys: BTreeMap<String, Vec<String>>,
    /// Foreign keys by table.
    pub foreign_keys: BTreeMap<String, Vec<ForeignKeyMetadata>>,
    /// Indexes by table.
    pub indexes: BTreeMap<String, Vec<IndexMetadata>>,
}

impl DatabaseMetadata {
    /// Table names in lexicographic order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.model_names.keys().map(String::as_str)
    }

    /// Whether a table is known.
    pub fn contains(&self, table: &str) -> bool {
        self.model_names.contains_key(table)
    }

    /// Indexes spanning more than one column, as field-name lists with their
    /// uniqueness flag.
    pub fn multi_column_indexes(&self, table: &str) -> Vec<(Vec<String>, bool)> {
        let columns = self.columns.get(table);
        self.indexes
            .get(table)
            .into_iter()
            .flatten()
            .filter(|index| index.columns.len() > 1)
            .map(|index| {
                let fields = index
                    .columns
                    .iter()
                    .map(|c| {
                        columns
                            .and_then(|cols| cols.get(c))
                            .map(|d| d.name.clone())
                            .unwrap_or_else(|| c.clone())
                    })
                    .collect();
                (fields, index.unique)
            })
            .collect()
    }
}

/// Applies naming rules and type mapping to a snapshot.
#[derive(Debug, Clone)]
pub struct Introspector {
    kind: DatabaseKind,
    snake_case: bool,
    column_types: BTreeMap<String, String>,
}

impl Introspector {
    /// Create an introspector for a database family.
    pub fn new(kind: DatabaseKind) -> Self {
        Self {
            kind,
            snake_case: true,
            column_types: BTreeMap::new(),
        }
    }

    /// Toggle snake_case field names.
    pub fn snake_case(mut self, enabled: bool) -> Self {
        self.snake_case = enabled;
        self
    }

    /// Map SQL type names (case-insensitive) to Rust type paths.
    pub fn column_types(mut self, mapping: &BTreeMap<String, String>) -> Self {
        self.column_types = mapping
            .iter()
            .map(|(sql, rust)| (sql.to_lowercase(), rust.clone()))
            .collect();
        self
    }

    /// Build descriptors for every table.
    pub fn introspect(&self, schema: &SchemaMetadata) -> DatabaseMetadata {
        let mut metadata = DatabaseMetadata {
            schema: schema.schema.clone(),
            ..Default::default()
        };

        let mut used_models = HashSet::new();
        for name in schema.tables.keys() {
            let model = unique_name(types::model_name(name), &mut used_models);
            metadata.model_names.insert(name.clone(), model);
        }

        for (name, table) in &schema.tables {
            let single_column: BTreeMap<&str, bool> = table
                .indexes
                .iter()
                .filter(|index| index.columns.len() == 1)
                .fold(BTreeMap::new(), |mut acc, index| {
                    let unique = acc.entry(index.columns[0].as_str()).or_insert(false);
                    *unique |= index.unique;
                    acc
                });

            let mut used_fields = HashSet::new();
            let mut columns = IndexMap::new();
            for column in &table.columns {
                let field = unique_name(
                    types::field_name(&column.name, self.snake_case),
                    &mut used_fields,
                );
                let indexed = single_column.get(column.name.as_str()).copied();
                let references = table
                    .foreign_keys
                    .iter()
                    .find(|fk| fk.column == column.name)
                    .map(|fk| Reference {
                        table: fk.dest_table.clone(),
                        column: fk.dest_column.clone(),
                    });
                let primary_key = table.primary_key.contains(&column.name);

                let descriptor = ColumnDescriptor {
                    name: field,
                    column_name: column.name.clone(),
                    sql_type: column.data_type.clone(),
                    field_type: self.field_type(&column.data_type),
                    nullable: column.nullable && !primary_key,
                    primary_key,
                    auto_increment: column.auto_increment,
                    unique: indexed == Some(true) && !primary_key,
                    index: indexed == Some(false) && !primary_key,
                    default: column.default.clone(),
                    max_length: column.max_length,
                    references,
                };
                columns.insert(column.name.clone(), descriptor);
            }

            debug!(table = %name, columns = columns.len(), "introspected table");
            metadata.columns.insert(name.clone(), columns);
            metadata
                .primary_keys
                .insert(name.clone(), table.primary_key.clone());
            metadata
                .foreign_keys
                .insert(name.clone(), table.foreign_keys.clone());
            metadata.indexes.insert(name.clone(), table.indexes.clone());
        }

        metadata
    }

    fn field_type(&self, data_type: &str) -> FieldType {
        let base = types::base_type_name(data_type);
        match self.column_types.get(&base) {
            Some(path) => FieldType::Custom(path.clone()),
            None => types::normalize_type(self.kind, data_type),
        }
    }
}

fn unique_name(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut suffix = 2;
    loop {
        let name = format!("{}_{}", candidate, suffix);
        if used.insert(name.clone()) {
            return name;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::snapshot::{ColumnMetadata, TableMetadata};

    fn schema() -> SchemaMetadata {
        SchemaMetadata::new()
            .with_table(
                TableMetadata::new("users")
                    .column(ColumnMetadata::new("id", "INTEGER").auto_increment())
                    .column(ColumnMetadata::new("Email", "VARCHAR(255)").max_length(255))
                    .column(ColumnMetadata::new("type", "TEXT").nullable())
                    .column(ColumnMetadata::new("colour", "COLOUR").nullable())
                    .primary_key(["id"])
                    .index("users_email", ["Email"], true),
            )
            .with_table(
                TableMetadata::new("posts")
                    .column(ColumnMetadata::new("id", "INTEGER").auto_increment())
                    .column(ColumnMetadata::new("author_id", "INTEGER"))
                    .column(ColumnMetadata::new("score", "WEIRD").default_value("0"))
                    .primary_key(["id"])
                    .foreign_key("author_id", "users", "id")
                    .index("posts_author", ["author_id"], false),
            )
    }

    #[test]
    fn test_model_names() {
        let metadata = Introspector::new(DatabaseKind::Sqlite).introspect(&schema());
        assert_eq!(metadata.model_names["users"], "Users");
        assert_eq!(metadata.table_names().collect::<Vec<_>>(), vec!["posts", "users"]);
    }

    #[test]
    fn test_field_parameters() {
        let metadata = Introspector::new(DatabaseKind::Sqlite).introspect(&schema());
        let users = &metadata.columns["users"];

        let email = &users["Email"];
        assert_eq!(email.name, "email");
        let params = email.field_parameters(&metadata.model_names);
        assert_eq!(params["column_name"], Value::from("Email"));
        assert_eq!(params["unique"], Value::Bool(true));
        assert_eq!(params["max_length"], Value::from(255));

        let kind = &users["type"];
        assert_eq!(kind.name, "r#type");
        assert_eq!(kind.rust_type(), "Option<String>");
        assert!(!kind.field_parameters(&metadata.model_names).contains_key("column_name"));

        let id = &users["id"];
        let params = id.field_parameters(&metadata.model_names);
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["primary_key"]);
    }

    #[test]
    fn test_foreign_key_and_unknown_type() {
        let metadata = Introspector::new(DatabaseKind::Sqlite).introspect(&schema());
        let posts = &metadata.columns["posts"];

        let params = posts["author_id"].field_parameters(&metadata.model_names);
        assert_eq!(params["index"], Value::Bool(true));
        assert_eq!(params["references"], Value::from("Users"));
        assert_eq!(params["to_field"], Value::from("id"));

        let params = posts["score"].field_parameters(&metadata.model_names);
        assert_eq!(params["sql_type"], Value::from("weird"));
        assert_eq!(params["default"], Value::from("0"));
    }

    #[test]
    fn test_custom_column_types() {
        let mut mapping = BTreeMap::new();
        mapping.insert("Colour".to_string(), "crate::types::Colour".to_string());
        let metadata = Introspector::new(DatabaseKind::Sqlite)
            .column_types(&mapping)
            .introspect(&schema());

        let colour = &metadata.columns["users"]["colour"];
        assert_eq!(colour.field_type, FieldType::Custom("crate::types::Colour".to_string()));
        assert_eq!(colour.rust_type(), "Option<Colour>");
    }

    #[test]
    fn test_field_name_collisions() {
        let schema = SchemaMetadata::new().with_table(
            TableMetadata::new("t")
                .column(ColumnMetadata::new("UserId", "INTEGER"))
                .column(ColumnMetadata::new("user_id", "INTEGER")),
        );
        let metadata = Introspector::new(DatabaseKind::Sqlite).introspect(&schema);
        let names: Vec<&str> = metadata.columns["t"].values().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["user_id", "user_id_2"]);
    }

    #[test]
    fn test_without_snake_case() {
        let metadata = Introspector::new(DatabaseKind::Sqlite)
            .snake_case(false)
            .introspect(&schema());
        assert_eq!(metadata.columns["users"]["Email"].name, "Email");
    }
}
