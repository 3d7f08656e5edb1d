//! Loadable migration units.
//!
//! Migrations written in Rust are linked in statically: each one exposes a
//! conventional entry point, `migrate(&mut dyn Connection)`, and is either
//! wrapped directly in a [`ModuleMigration`] (usually through
//! [`module_migration!`](crate::module_migration)) or registered in a
//! [`PluginRegistry`] and paired with its script file as a
//! [`ScriptMigration`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::connection::Connection;
use crate::error::{MigrateResult, MigrationError};
use crate::migration::{Migration, NULL_HASH, content_hash};

/// Conventional migration entry point.
pub type EntryPoint = fn(&mut dyn Connection) -> MigrateResult<()>;

/// A migration living in a Rust module.
///
/// The name is the module path and the hash is always [`NULL_HASH`].
#[derive(Clone, Copy)]
pub struct ModuleMigration {
    module: &'static str,
    entry: EntryPoint,
}

impl ModuleMigration {
    /// Wrap a module's entry point.
    pub const fn new(module: &'static str, entry: EntryPoint) -> Self {
        Self { module, entry }
    }
}

impl fmt::Debug for ModuleMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleMigration")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl Migration for ModuleMigration {
    fn name(&self) -> &str {
        self.module
    }

    fn hash(&self) -> &str {
        NULL_HASH
    }

    fn execute(&self, conn: &mut dyn Connection) -> MigrateResult<()> {
        (self.entry)(conn)
    }
}

/// Build a [`ModuleMigration`] from a module exposing `migrate`.
///
/// ```rust,ignore
/// mod m0001_create_users {
///     pub fn migrate(conn: &mut dyn Connection) -> MigrateResult<()> {
///         conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY)")
///     }
/// }
///
/// let migration = keel_migrate::module_migration!(m0001_create_users);
/// ```
#[macro_export]
macro_rules! module_migration {
    ($($segment:ident)::+) => {
        $crate::plugin::ModuleMigration::new(
            stringify!($($segment)::+),
            $($segment)::+::migrate,
        )
    };
}

/// Registry of statically linked entry points, keyed by migration name.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    entries: HashMap<String, EntryPoint>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry point under a name.
    pub fn register(&mut self, name: impl Into<String>, entry: EntryPoint) -> &mut Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// Builder-style registration.
    pub fn with(mut self, name: impl Into<String>, entry: EntryPoint) -> Self {
        self.register(name, entry);
        self
    }

    /// Look up an entry point.
    pub fn get(&self, name: &str) -> Option<EntryPoint> {
        self.entries.get(name).copied()
    }

    /// Number of registered entry points.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A migration script on disk whose behaviour is provided by a registered
/// entry point.
///
/// The hash is the digest of the script file, so editing the script is
/// reported as drift even though the executed code is linked in.
pub struct ScriptMigration {
    name: String,
    path: PathBuf,
    hash: String,
    entry: EntryPoint,
}

impl ScriptMigration {
    /// Load a script and bind it to its entry point.
    ///
    /// The entry point is looked up under the derived name first, then under
    /// the file stem.
    pub fn load(path: impl AsRef<Path>, registry: &PluginRegistry) -> MigrateResult<Self> {
        let path = path.as_ref();
        let name = script_name(path);
        let content = std::fs::read(path)?;

        let stem = path.file_stem().and_then(|s| s.to_str());
        let entry = registry
            .get(&name)
            .or_else(|| stem.and_then(|s| registry.get(s)))
            .ok_or_else(|| MigrationError::MissingEntryPoint(name.clone()))?;

        Ok(Self {
            name,
            path: path.to_path_buf(),
            hash: content_hash(&content),
            entry,
        })
    }

    /// The script file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for ScriptMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptMigration")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl Migration for ScriptMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> &str {
        &self.hash
    }

    fn execute(&self, conn: &mut dyn Connection) -> MigrateResult<()> {
        (self.entry)(conn)
    }
}

/// Derive an identifier-safe name from a script path: every non-word
/// character becomes `_`, and a leading digit gets a `_` prefix.
pub fn script_name(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut name = String::with_capacity(raw.len() + 1);
    if raw.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.push('_');
    }
    name.extend(
        raw.chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }),
    );
    name
}
