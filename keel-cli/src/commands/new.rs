//! `keel new` command - Create a migration file from a template.

use std::path::PathBuf;

use keel_migrate::MigrationFileManager;

use crate::cli::NewArgs;
use crate::error::{CliError, CliResult};
use crate::output::success;

/// Run the new command
pub fn run(args: NewArgs) -> CliResult<PathBuf> {
    if !args.output_dir.is_dir() {
        return Err(CliError::Config(format!(
            "output directory not found: {}",
            args.output_dir.display()
        )));
    }

    let mut manager = MigrationFileManager::new(&args.output_dir);
    if let Some(dir) = &args.templates_dir {
        if !dir.is_dir() {
            return Err(CliError::Config(format!(
                "templates directory not found: {}",
                dir.display()
            )));
        }
        manager = manager.with_templates_dir(dir);
    }

    let path = manager.write_migration(&args.name, args.description.as_deref(), args.kind.into())?;
    success(&format!("Created {}", path.display()));
    Ok(path)
}
