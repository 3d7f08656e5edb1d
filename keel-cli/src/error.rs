//! CLI error types and result alias.

use keel_codegen::CodegenError;
use keel_migrate::MigrationError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(keel::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(keel::config))]
    Config(String),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(keel::migration))]
    Migration(#[from] MigrationError),

    /// Code generation error
    #[error("{0}")]
    #[diagnostic(code(keel::codegen))]
    Codegen(#[from] CodegenError),

    /// Database connection error
    #[error("Database error: {0}")]
    #[diagnostic(
        code(keel::database),
        help("database URLs look like sqlite:PATH, sqlite::memory: or postgres://user@host/db")
    )]
    Database(String),
}

impl CliError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

#[cfg(feature = "sqlite")]
impl From<keel_sqlite::SqliteError> for CliError {
    fn from(err: keel_sqlite::SqliteError) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<keel_postgres::PgError> for CliError {
    fn from(err: keel_postgres::PgError) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_error_is_shown_unchanged() {
        let err: CliError = MigrationError::execution("0002.sql", MigrationError::database("boom")).into();
        assert_eq!(err.to_string(), "Migration '0002.sql' failed: Database error: boom");
    }

    #[test]
    fn test_database_error_has_help() {
        let err = CliError::database("unsupported database URL 'mysql://x'");
        assert!(err.help().is_some());
        assert!(err.to_string().contains("mysql://x"));
    }
}
