//! Type mapping from SQL column types to Rust field types.

use convert_case::{Boundary, Case, Casing};
use serde::{Deserialize, Serialize};

use crate::snapshot::DatabaseKind;

/// Normalized field type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Fixed-point decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// Character data of any length.
    Text,
    /// Binary data.
    Bytes,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Timestamp without time zone.
    Timestamp,
    /// Timestamp with time zone.
    TimestampTz,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
    /// User-mapped type, as a path (`crate::types::Colour`).
    Custom(String),
    /// Unrecognized SQL type; rendered as `String`.
    Unknown(String),
}

impl FieldType {
    /// Rust type name as written in generated code (imports supply the path).
    pub fn rust_type(&self) -> String {
        match self {
            Self::SmallInt => "i16".to_string(),
            Self::Int => "i32".to_string(),
            Self::BigInt => "i64".to_string(),
            Self::Float => "f32".to_string(),
            Self::Double => "f64".to_string(),
            Self::Decimal => "Decimal".to_string(),
            Self::Boolean => "bool".to_string(),
            Self::Text | Self::Unknown(_) => "String".to_string(),
            Self::Bytes => "Vec<u8>".to_string(),
            Self::Date => "NaiveDate".to_string(),
            Self::Time => "NaiveTime".to_string(),
            Self::Timestamp => "NaiveDateTime".to_string(),
            Self::TimestampTz => "DateTime<Utc>".to_string(),
            Self::Json => "Value".to_string(),
            Self::Uuid => "Uuid".to_string(),
            Self::Custom(path) => split_path(path).1.to_string(),
        }
    }

    /// Names this type needs imported, as `(namespace, name)` pairs.
    pub fn imports(&self) -> Vec<(String, String)> {
        let pairs: &[(&str, &str)] = match self {
            Self::Decimal => &[("rust_decimal", "Decimal")],
            Self::Date => &[("chrono", "NaiveDate")],
            Self::Time => &[("chrono", "NaiveTime")],
            Self::Timestamp => &[("chrono", "NaiveDateTime")],
            Self::TimestampTz => &[("chrono", "DateTime"), ("chrono", "Utc")],
            Self::Json => &[("serde_json", "Value")],
            Self::Uuid => &[("uuid", "Uuid")],
            Self::Custom(path) => {
                return match split_path(path) {
                    (Some(module), name) => vec![(module.to_string(), name.to_string())],
                    (None, _) => Vec::new(),
                };
            }
            _ => &[],
        };
        pairs
            .iter()
            .map(|(m, n)| (m.to_string(), n.to_string()))
            .collect()
    }

    /// Whether values are integers (candidates for auto-generated keys).
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::SmallInt | Self::Int | Self::BigInt)
    }
}

/// Wrap a Rust type in `Option` when the column is nullable.
pub fn apply_nullability(rust_type: String, nullable: bool) -> String {
    if nullable {
        format!("Option<{}>", rust_type)
    } else {
        rust_type
    }
}

fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once("::") {
        Some((module, name)) => (Some(module), name),
        None => (None, path),
    }
}

/// Lowercase base name of a declared SQL type: `VARCHAR(255)` becomes
/// `varchar`, `character varying` stays as is.
pub fn base_type_name(data_type: &str) -> String {
    let base = match data_type.find('(') {
        Some(idx) => &data_type[..idx],
        None => data_type,
    };
    base.trim().to_lowercase()
}

/// Length argument of a declared SQL type: `VARCHAR(255)` gives 255.
pub fn declared_length(data_type: &str) -> Option<u32> {
    let start = data_type.find('(')?;
    let end = data_type[start..].find(')')? + start;
    data_type[start + 1..end].trim().parse().ok()
}

/// Map a database type name to a normalized field type.
pub fn normalize_type(kind: DatabaseKind, data_type: &str) -> FieldType {
    let base = base_type_name(data_type);
    match kind {
        DatabaseKind::Postgresql => normalize_postgres_type(&base),
        DatabaseKind::Mysql => normalize_mysql_type(&base),
        DatabaseKind::Sqlite => normalize_sqlite_type(&base),
    }
}

fn normalize_postgres_type(type_name: &str) -> FieldType {
    match type_name {
        "int2" | "smallint" | "smallserial" => FieldType::SmallInt,
        "int4" | "integer" | "int" | "serial" => FieldType::Int,
        "int8" | "bigint" | "bigserial" => FieldType::BigInt,
        "real" | "float4" => FieldType::Float,
        "double precision" | "float8" => FieldType::Double,
        "numeric" | "decimal" | "money" => FieldType::Decimal,
        "bool" | "boolean" => FieldType::Boolean,
        "text" | "varchar" | "character varying" | "char" | "character" | "bpchar" | "citext"
        | "name" => FieldType::Text,
        "bytea" => FieldType::Bytes,
        "timestamp" | "timestamp without time zone" => FieldType::Timestamp,
        "timestamptz" | "timestamp with time zone" => FieldType::TimestampTz,
        "date" => FieldType::Date,
        "time" | "time without time zone" | "timetz" | "time with time zone" => FieldType::Time,
        "json" | "jsonb" => FieldType::Json,
        "uuid" => FieldType::Uuid,
        t => FieldType::Unknown(t.to_string()),
    }
}

fn normalize_mysql_type(type_name: &str) -> FieldType {
    match type_name {
        "tinyint" | "smallint" => FieldType::SmallInt,
        "int" | "integer" | "mediumint" => FieldType::Int,
        "bigint" => FieldType::BigInt,
        "float" => FieldType::Float,
        "double" | "real" => FieldType::Double,
        "decimal" | "numeric" => FieldType::Decimal,
        "bit" | "bool" | "boolean" => FieldType::Boolean,
        "text" | "tinytext" | "mediumtext" | "longtext" | "varchar" | "char" => FieldType::Text,
        "tinyblob" | "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            FieldType::Bytes
        }
        "datetime" | "timestamp" => FieldType::Timestamp,
        "date" => FieldType::Date,
        "time" => FieldType::Time,
        "json" => FieldType::Json,
        t => FieldType::Unknown(t.to_string()),
    }
}

fn normalize_sqlite_type(type_name: &str) -> FieldType {
    // Exact names first, then SQLite's affinity rules.
    match type_name {
        "bigint" | "int8" => return FieldType::BigInt,
        "smallint" | "int2" | "tinyint" => return FieldType::SmallInt,
        "bool" | "boolean" => return FieldType::Boolean,
        "date" => return FieldType::Date,
        "time" => return FieldType::Time,
        "datetime" | "timestamp" => return FieldType::Timestamp,
        "json" => return FieldType::Json,
        "uuid" => return FieldType::Uuid,
        "decimal" | "numeric" => return FieldType::Decimal,
        "float" => return FieldType::Float,
        _ => {}
    }

    if type_name.contains("int") {
        FieldType::Int
    } else if ["char", "clob", "text"].iter().any(|t| type_name.contains(t)) {
        FieldType::Text
    } else if type_name.contains("blob") || type_name.is_empty() {
        FieldType::Bytes
    } else if ["real", "floa", "doub"].iter().any(|t| type_name.contains(t)) {
        FieldType::Double
    } else {
        FieldType::Unknown(type_name.to_string())
    }
}

// Digits never start a new word, so `user_id2` stays `user_id2`.
const WORD_BOUNDARIES: &[Boundary] = &[
    Boundary::Underscore,
    Boundary::Hyphen,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::Acronym,
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Check if a name is a Rust keyword.
pub fn is_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name)
}

/// Turn a column name into a field identifier.
pub fn field_name(column: &str, snake_case: bool) -> String {
    let mut name = if snake_case {
        column.with_boundaries(WORD_BOUNDARIES).to_case(Case::Snake)
    } else {
        column
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    };
    if name.is_empty() {
        name.push('_');
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    match name.as_str() {
        // Cannot be raw identifiers.
        "self" | "Self" | "super" | "crate" => format!("{}_", name),
        n if is_keyword(n) => format!("r#{}", n),
        _ => name,
    }
}

/// Convert a table name to a model (type) name.
pub fn model_name(table: &str) -> String {
    let mut name = table.with_boundaries(WORD_BOUNDARIES).to_case(Case::Pascal);
    name.retain(|c| c.is_alphanumeric() || c == '_');
    if name.is_empty() || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if name == "Self" {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_postgres_type() {
        assert_eq!(normalize_type(DatabaseKind::Postgresql, "int4"), FieldType::Int);
        assert_eq!(
            normalize_type(DatabaseKind::Postgresql, "character varying"),
            FieldType::Text
        );
        assert_eq!(
            normalize_type(DatabaseKind::Postgresql, "timestamp with time zone"),
            FieldType::TimestampTz
        );
        assert_eq!(
            normalize_type(DatabaseKind::Postgresql, "tsvector"),
            FieldType::Unknown("tsvector".to_string())
        );
    }

    #[test]
    fn test_normalize_sqlite_affinity() {
        assert_eq!(normalize_type(DatabaseKind::Sqlite, "INTEGER"), FieldType::Int);
        assert_eq!(normalize_type(DatabaseKind::Sqlite, "VARCHAR(255)"), FieldType::Text);
        assert_eq!(normalize_type(DatabaseKind::Sqlite, "DOUBLE PRECISION"), FieldType::Double);
        assert_eq!(normalize_type(DatabaseKind::Sqlite, "BIGINT"), FieldType::BigInt);
        assert_eq!(normalize_type(DatabaseKind::Sqlite, ""), FieldType::Bytes);
        assert_eq!(normalize_type(DatabaseKind::Sqlite, "DATETIME"), FieldType::Timestamp);
        assert_eq!(
            normalize_type(DatabaseKind::Sqlite, "COLOUR"),
            FieldType::Unknown("colour".to_string())
        );
    }

    #[test]
    fn test_normalize_mysql_type() {
        assert_eq!(normalize_type(DatabaseKind::Mysql, "tinyint"), FieldType::SmallInt);
        assert_eq!(normalize_type(DatabaseKind::Mysql, "longblob"), FieldType::Bytes);
    }

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length("VARCHAR(255)"), Some(255));
        assert_eq!(declared_length("DECIMAL(10, 2)"), None);
        assert_eq!(declared_length("TEXT"), None);
        assert_eq!(base_type_name(" Varchar (32)"), "varchar");
    }

    #[test]
    fn test_rust_types_and_imports() {
        assert_eq!(FieldType::TimestampTz.rust_type(), "DateTime<Utc>");
        assert_eq!(
            FieldType::TimestampTz.imports(),
            vec![
                ("chrono".to_string(), "DateTime".to_string()),
                ("chrono".to_string(), "Utc".to_string())
            ]
        );
        assert!(FieldType::Int.imports().is_empty());

        let custom = FieldType::Custom("crate::types::Colour".to_string());
        assert_eq!(custom.rust_type(), "Colour");
        assert_eq!(
            custom.imports(),
            vec![("crate::types".to_string(), "Colour".to_string())]
        );
        assert!(FieldType::Custom("Colour".to_string()).imports().is_empty());
    }

    #[test]
    fn test_apply_nullability() {
        assert_eq!(apply_nullability("i32".to_string(), true), "Option<i32>");
        assert_eq!(apply_nullability("i32".to_string(), false), "i32");
    }

    #[test]
    fn test_field_name() {
        assert_eq!(field_name("FavouriteColour", true), "favourite_colour");
        assert_eq!(field_name("type", true), "r#type");
        assert_eq!(field_name("self", true), "self_");
        assert_eq!(field_name("2fa_secret", true), "_2fa_secret");
        assert_eq!(field_name("first name", false), "first_name");
    }

    #[test]
    fn test_model_name() {
        assert_eq!(model_name("user_accounts"), "UserAccounts");
        assert_eq!(model_name("posts"), "Posts");
        assert_eq!(model_name("2fa"), "_2fa");
    }
}
