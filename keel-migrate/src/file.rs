//! Migration file management.
//!
//! Discovery turns glob patterns into [`SqlMigration`]s; the
//! [`MigrationFileManager`] writes new migration files from templates.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::{MigrateResult, MigrationError};
use crate::migration::SqlMigration;

/// Built-in template for SQL migrations.
pub const SQL_TEMPLATE: &str = "\
-- {{ name }}
{{ description_comment }}-- generated at {{ generated_at }}

";

/// Expand glob patterns into SQL migrations.
///
/// Patterns are processed in the order given; the matches of each pattern
/// are sorted by path. A pattern that matches nothing contributes nothing.
pub fn discover<I, S>(patterns: I) -> MigrateResult<Vec<SqlMigration>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut migrations = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let mut paths = expand(pattern)?;
        paths.sort();
        debug!(pattern, matches = paths.len(), "expanded migration pattern");
        for path in paths {
            migrations.push(SqlMigration::from_path(&path)?);
        }
    }
    Ok(migrations)
}

fn expand(pattern: &str) -> MigrateResult<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| {
        MigrationError::invalid_migration(format!("invalid glob pattern '{}': {}", pattern, e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MigrationError::Io(e.into_error()))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Kind of migration file to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationKind {
    /// Guess from the file extension.
    #[default]
    Auto,
    /// SQL statements.
    Sql,
}

impl MigrationKind {
    /// File extension for this kind, `None` for [`MigrationKind::Auto`].
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Sql => Some("sql"),
        }
    }

    /// Resolve `Auto` from a file name's extension.
    pub fn resolve(self, name: &str) -> MigrateResult<Self> {
        if self != Self::Auto {
            return Ok(self);
        }
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| MigrationError::invalid_migration("cannot guess migration type"))?;
        ext.parse()
    }
}

impl FromStr for MigrationKind {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "sql" => Ok(Self::Sql),
            other => Err(MigrationError::invalid_migration(format!(
                "unsupported migration type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension().unwrap_or("auto"))
    }
}

/// Migration file writer.
pub struct MigrationFileManager {
    /// Directory where migrations are written.
    migrations_dir: PathBuf,
    /// Directory holding `migration.<type>.tmpl` templates.
    templates_dir: Option<PathBuf>,
}

impl MigrationFileManager {
    /// Create a new file manager.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            templates_dir: None,
        }
    }

    /// Use templates from a directory instead of the built-in ones.
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Write a new migration file and return its path.
    ///
    /// The kind's extension is appended to `name` unless already present.
    pub fn write_migration(
        &self,
        name: &str,
        description: Option<&str>,
        kind: MigrationKind,
    ) -> MigrateResult<PathBuf> {
        let kind = kind.resolve(name)?;
        let ext = kind.extension().unwrap_or("sql");

        let suffix = format!(".{}", ext);
        let file_name = if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        };

        let template = self.template(ext)?;
        let content = render_template(&template, &file_name, description, Local::now());

        let path = self.migrations_dir.join(&file_name);
        std::fs::write(&path, content)?;
        debug!(path = %path.display(), "wrote migration file");
        Ok(path)
    }

    fn template(&self, ext: &str) -> MigrateResult<String> {
        match &self.templates_dir {
            Some(dir) => {
                let path = dir.join(format!("migration.{}.tmpl", ext));
                if !path.is_file() {
                    return Err(MigrationError::invalid_migration(format!(
                        "no template for {} found",
                        ext
                    )));
                }
                Ok(std::fs::read_to_string(path)?)
            }
            None if ext == "sql" => Ok(SQL_TEMPLATE.to_string()),
            None => Err(MigrationError::invalid_migration(format!(
                "no template for {} found",
                ext
            ))),
        }
    }
}

/// Substitute `{{ name }}`, `{{ description }}`, `{{ description_comment }}`
/// and `{{ generated_at }}` in a template.
pub fn render_template(
    template: &str,
    name: &str,
    description: Option<&str>,
    generated_at: DateTime<Local>,
) -> String {
    let description_comment = description
        .map(|d| {
            d.lines()
                .map(|line| format!("-- {}\n", line))
                .collect::<String>()
        })
        .unwrap_or_default();
    let generated_at = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    let values = [
        ("name", name),
        ("description", description.unwrap_or("")),
        ("description_comment", description_comment.as_str()),
        ("generated_at", generated_at.as_str()),
    ];

    let mut out = template.to_string();
    for (key, value) in values {
        out = out
            .replace(&format!("{{{{ {} }}}}", key), value)
            .replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}
