//! Error types for model generation.

use thiserror::Error;

/// Result type alias for generation operations.
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Failure ordering tables by foreign-key dependency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Following foreign keys led back to a table still being resolved.
    #[error("reference cycle: {table} (via {})", path.join(" -> "))]
    CycleDetected {
        /// Table that closes the cycle.
        table: String,
        /// Tables being resolved when the cycle was found, outermost first.
        path: Vec<String>,
    },

    /// A filtered-out table is the target of a foreign key.
    #[error("cannot exclude table '{table}' as it is required by a foreign key relation from '{required_by}'")]
    RequiredTableExcluded {
        /// The excluded table.
        table: String,
        /// The table holding the foreign key.
        required_by: String,
    },

    /// A foreign key targets a table missing from the snapshot.
    #[error("table '{referenced_by}' references unknown table '{table}'")]
    UnknownTable {
        /// The missing table.
        table: String,
        /// The table holding the foreign key.
        referenced_by: String,
    },
}

/// Errors that can occur during model generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading the schema snapshot failed.
    #[error("Introspection error: {0}")]
    Introspection(String),

    /// Tables could not be ordered.
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Invalid generator configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A table pattern is not a valid regular expression.
    #[error("Invalid table pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// Rendering the template data failed.
    #[error("Render error: {0}")]
    Render(String),
}

impl CodegenError {
    /// Create an introspection error.
    pub fn introspection(msg: impl Into<String>) -> Self {
        Self::Introspection(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Check if this is a resolution error.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}

impl From<toml::de::Error> for CodegenError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CodegenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}
