//! `keel migrate` command - Apply migrations to a database.

use keel_migrate::{MigrationConfig, MigrationEngine, MigrationResult, discover};
use tracing::debug;

use crate::cli::MigrateArgs;
use crate::db::Database;
use crate::error::CliResult;
use crate::observer;
use crate::output::{Console, Styler};

/// Run the migrate command
pub fn run(args: MigrateArgs) -> CliResult<MigrationResult> {
    let console = Console::stdout(Styler::new(args.color));

    let migrations = discover(&args.migrations)?;
    debug!(count = migrations.len(), patterns = ?args.migrations, "collected migrations");

    let config = MigrationConfig::new()
        .table_name(&args.table_name)
        .text_type(&args.text_type)
        .fix_warnings(args.fix);
    config.validate()?;

    let engine =
        MigrationEngine::new(config).with_observer(observer::for_verbosity(args.verbose, &console));

    let mut database = Database::connect(&args.db_url)?;
    Ok(engine.migrate(database.connection(), &migrations)?)
}
