//! Migration units.
//!
//! Every unit exposes the same capability set: a name that is unique within
//! a run, a hash identifying its content, and an action that executes it
//! against a [`Connection`]. Units that have no byte-addressable content
//! report [`NULL_HASH`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::connection::Connection;
use crate::error::{MigrateResult, MigrationError};
use crate::split::split_statements;

/// Sentinel hash reported by units without content-addressable identity.
pub const NULL_HASH: &str = "0000000000000000000000000000000000000000";

/// A single migration unit.
pub trait Migration {
    /// Unique name of the migration.
    fn name(&self) -> &str;

    /// Hex digest of the migration content, or [`NULL_HASH`].
    fn hash(&self) -> &str;

    /// Run the migration.
    fn execute(&self, conn: &mut dyn Connection) -> MigrateResult<()>;
}

impl fmt::Debug for dyn Migration + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name())
            .field("hash", &self.hash())
            .finish()
    }
}

impl<M: Migration + ?Sized> Migration for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn hash(&self) -> &str {
        (**self).hash()
    }

    fn execute(&self, conn: &mut dyn Connection) -> MigrateResult<()> {
        (**self).execute(conn)
    }
}

/// Compute the lowercase hex SHA-256 digest of some content.
pub fn content_hash(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    hex::encode(hasher.finalize())
}

/// A migration made of SQL statements.
#[derive(Debug)]
pub struct SqlMigration {
    name: String,
    path: Option<PathBuf>,
    content: String,
    hash: OnceLock<String>,
}

impl SqlMigration {
    /// Create a migration from in-memory SQL.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            content: content.into(),
            hash: OnceLock::new(),
        }
    }

    /// Read a migration from a file. The name is the file name.
    pub fn from_path(path: impl AsRef<Path>) -> MigrateResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MigrationError::invalid_migration(format!("invalid file name: {}", path.display()))
            })?
            .to_string();
        Self::from_path_named(path, name)
    }

    /// Read a migration from a file under an explicit name.
    pub fn from_path_named(path: impl AsRef<Path>, name: impl Into<String>) -> MigrateResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            name: name.into(),
            path: Some(path.to_path_buf()),
            content,
            hash: OnceLock::new(),
        })
    }

    /// The source file, when read from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The raw SQL content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Migration for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> &str {
        self.hash.get_or_init(|| content_hash(&self.content))
    }

    fn execute(&self, conn: &mut dyn Connection) -> MigrateResult<()> {
        for statement in split_statements(&self.content, conn.dialect()) {
            trace!(migration = %self.name, sql = %statement, "executing statement");
            conn.execute(&statement)?;
        }
        Ok(())
    }
}

/// A migration backed by a caller-supplied function.
pub struct FnMigration<F> {
    name: String,
    action: F,
}

impl<F> FnMigration<F>
where
    F: Fn(&mut dyn Connection) -> MigrateResult<()>,
{
    /// Create a migration named after the function's type.
    pub fn new(action: F) -> Self {
        Self {
            name: std::any::type_name::<F>().to_string(),
            action,
        }
    }

    /// Create a migration with an explicit name.
    pub fn named(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<F> fmt::Debug for FnMigration<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Migration for FnMigration<F>
where
    F: Fn(&mut dyn Connection) -> MigrateResult<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> &str {
        NULL_HASH
    }

    fn execute(&self, conn: &mut dyn Connection) -> MigrateResult<()> {
        (self.action)(conn)
    }
}
