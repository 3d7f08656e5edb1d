//! Error types for PostgreSQL operations.

use keel_codegen::CodegenError;
use keel_migrate::MigrationError;
use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// SQLSTATE code reported by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(|c| c.code()),
            Self::Config(_) => None,
        }
    }

    /// Check if the connection to the server was lost.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Postgres(e) if e.is_closed())
    }
}

impl From<PgError> for MigrationError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Config(msg) => MigrationError::invalid_config(msg),
            PgError::Postgres(e) => match e.code() {
                Some(code) => MigrationError::database(format!("{} (SQLSTATE {})", e, code.code())),
                None => MigrationError::database(e.to_string()),
            },
        }
    }
}

impl From<PgError> for CodegenError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Config(msg) => CodegenError::config(msg),
            PgError::Postgres(e) => CodegenError::introspection(e.to_string()),
        }
    }
}
