//! Error types for SQLite operations.

use keel_codegen::CodegenError;
use keel_migrate::MigrationError;
use thiserror::Error;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog contents could not be interpreted.
    #[error("Introspection error: {0}")]
    Introspection(String),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an introspection error.
    pub fn introspection(msg: impl Into<String>) -> Self {
        Self::Introspection(msg.into())
    }
}

impl From<SqliteError> for MigrationError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Config(msg) => MigrationError::invalid_config(msg),
            other => MigrationError::database(other.to_string()),
        }
    }
}

impl From<SqliteError> for CodegenError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Config(msg) => CodegenError::config(msg),
            other => CodegenError::introspection(other.to_string()),
        }
    }
}
