//! Generator configuration.
//!
//! ```toml
//! [database]
//! driver = "sqlite"
//!
//! [models]
//! include_views = false
//! exclude_tables = ["migrations", "/^tmp_/"]
//! snake_case = true
//!
//! [models.column_types]
//! colour = "crate::types::Colour"
//!
//! [output]
//! path = "models.json"
//! pretty = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CodegenResult;
use crate::filter::TableFilter;
use crate::snapshot::DatabaseKind;

/// Generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Model selection and naming
    pub models: ModelsConfig,

    /// Output configuration
    pub output: OutputConfig,
}

impl GeneratorConfig {
    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> CodegenResult<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Compile the table filter.
    pub fn table_filter(&self) -> CodegenResult<TableFilter> {
        TableFilter::new(&self.models.include_tables, &self.models.exclude_tables)
    }
}

impl std::str::FromStr for GeneratorConfig {
    type Err = crate::error::CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database driver; detected from the connection when absent
    pub driver: Option<DatabaseKind>,

    /// Schema to read (PostgreSQL)
    pub schema: Option<String>,
}

/// Model selection and naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Whether views become models
    pub include_views: bool,

    /// Table whitelist (names or `/regex/`)
    pub include_tables: Vec<String>,

    /// Tables to leave out (names or `/regex/`)
    pub exclude_tables: Vec<String>,

    /// Convert column names to snake_case field names
    pub snake_case: bool,

    /// SQL type name to Rust type path
    pub column_types: BTreeMap<String, String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            include_views: false,
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            snake_case: true,
            column_types: BTreeMap::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File the rendered models are written to
    pub path: PathBuf,

    /// Indent the output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models.json"),
            pretty: true,
        }
    }
}
