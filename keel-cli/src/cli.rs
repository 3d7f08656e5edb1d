//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use keel_migrate::MigrationKind;

/// keel - ledger-tracked SQL migrations and model generation
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(version)]
#[command(about = "keel - ledger-tracked SQL migrations and model generation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply migrations to a database
    Migrate(MigrateArgs),

    /// Create a new migration file from a template
    New(NewArgs),

    /// Generate models from a live database schema
    Generate(GenerateArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Migrate Command
// =============================================================================

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Database URL (sqlite:PATH, sqlite::memory:, postgres://...)
    #[arg(env = "KEEL_DATABASE_URL")]
    pub db_url: String,

    /// Set the verbosity level (can be specified up to three times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The name of the migrations table in the database
    #[arg(short = 't', long, default_value = "migrations")]
    pub table_name: String,

    /// The type of text fields to use when creating the migrations table
    #[arg(short = 'T', long, default_value = "TEXT")]
    pub text_type: String,

    /// Fix migrations which would usually generate a warning
    #[arg(short, long)]
    pub fix: bool,

    /// Control how the output is colored
    #[arg(short, long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// A glob pattern for sql files to be used as migrations
    #[arg(short = 'm', long = "migration")]
    pub migrations: Vec<String>,
}

/// When to color output
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

// =============================================================================
// New Command
// =============================================================================

/// Arguments for the `new` command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// File name of the migration; the extension is added when missing
    pub name: String,

    /// Description written into the migration header
    pub description: Option<String>,

    /// Path to generate the new migration in
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Migration type
    #[arg(short = 't', long = "type", value_enum, default_value_t = MigrationType::Auto)]
    pub kind: MigrationType,

    /// Path where templates (named migration.TYPE.tmpl) should be found
    #[arg(short = 'T', long)]
    pub templates_dir: Option<PathBuf>,
}

/// Migration file types
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MigrationType {
    /// Guess from the file extension
    #[default]
    Auto,
    /// SQL statements
    Sql,
}

impl From<MigrationType> for MigrationKind {
    fn from(kind: MigrationType) -> Self {
        match kind {
            MigrationType::Auto => MigrationKind::Auto,
            MigrationType::Sql => MigrationKind::Sql,
        }
    }
}

// =============================================================================
// Generate Command
// =============================================================================

/// Arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the generator configuration (TOML)
    pub config: PathBuf,

    /// Database URL to read the schema from
    #[arg(env = "KEEL_DATABASE_URL")]
    pub db_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_migrate() {
        let cli = Cli::try_parse_from([
            "keel", "migrate", "sqlite:app.db", "-vvv", "-f", "-c", "never", "-m", "a/*.sql", "-m",
            "b/*.sql", "-T", "VARCHAR(255)",
        ])
        .unwrap();
        let Command::Migrate(args) = cli.command else {
            panic!("expected migrate");
        };
        assert_eq!(args.db_url, "sqlite:app.db");
        assert_eq!(args.verbose, 3);
        assert!(args.fix);
        assert_eq!(args.color, ColorChoice::Never);
        assert_eq!(args.migrations, vec!["a/*.sql", "b/*.sql"]);
        assert_eq!(args.table_name, "migrations");
        assert_eq!(args.text_type, "VARCHAR(255)");
    }

    #[test]
    fn test_parse_new() {
        let cli = Cli::try_parse_from(["keel", "new", "0001_init", "first", "-t", "sql"]).unwrap();
        let Command::New(args) = cli.command else {
            panic!("expected new");
        };
        assert_eq!(args.name, "0001_init");
        assert_eq!(args.description.as_deref(), Some("first"));
        assert_eq!(MigrationKind::from(args.kind), MigrationKind::Sql);
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_rejects_unknown_color() {
        assert!(Cli::try_parse_from(["keel", "migrate", "sqlite:a.db", "-c", "sometimes"]).is_err());
    }
}
