//! Error types for the migration engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// The ledger operation that was in progress when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOperation {
    /// Checking whether the ledger table exists.
    Check,
    /// Creating the ledger table.
    Create,
    /// Reading a ledger row.
    Read,
    /// Inserting a ledger row.
    Insert,
    /// Updating a ledger row in fix mode.
    Update,
}

impl fmt::Display for LedgerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Check => "checking",
            Self::Create => "creating",
            Self::Read => "reading",
            Self::Insert => "inserting into",
            Self::Update => "updating",
        };
        f.write_str(verb)
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the database driver.
    #[error("Database error: {0}")]
    Database(String),

    /// Failure creating, reading or writing the ledger table.
    #[error("Ledger error while {operation} table '{table}': {source}")]
    Ledger {
        /// Ledger table name.
        table: String,
        /// Operation that failed.
        operation: LedgerOperation,
        /// Underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// A migration unit failed to execute.
    #[error("Migration '{name}' failed: {source}")]
    Execution {
        /// Name of the failing migration.
        name: String,
        /// Underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// A ledger row could not be decoded.
    #[error("Invalid ledger record for '{name}': {message}")]
    InvalidRecord {
        /// Migration name of the row.
        name: String,
        /// What was wrong with it.
        message: String,
    },

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid migration file or definition.
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// A loadable migration has no registered entry point.
    #[error("No entry point registered for migration '{0}'")]
    MissingEntryPoint(String),

    /// General migration error.
    #[error("Migration error: {0}")]
    Other(String),
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Wrap an error as a ledger failure.
    pub fn ledger(table: impl Into<String>, operation: LedgerOperation, source: Self) -> Self {
        Self::Ledger {
            table: table.into(),
            operation,
            source: Box::new(source),
        }
    }

    /// Wrap an error as the failure of a named migration.
    pub fn execution(name: impl Into<String>, source: Self) -> Self {
        Self::Execution {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid migration error.
    pub fn invalid_migration(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Create an other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Name of the failing migration, if this is an execution error.
    pub fn failed_migration(&self) -> Option<&str> {
        match self {
            Self::Execution { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Check if this error originated from the ledger table.
    pub fn is_ledger_error(&self) -> bool {
        matches!(self, Self::Ledger { .. })
    }
}
