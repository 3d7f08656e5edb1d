//! `keel generate` command - Generate models from a live database schema.

use std::path::PathBuf;

use keel_codegen::Generator;

use crate::cli::GenerateArgs;
use crate::db::Database;
use crate::error::{CliError, CliResult};
use crate::output::success;

/// Run the generate command
pub fn run(args: GenerateArgs) -> CliResult<PathBuf> {
    if !args.config.is_file() {
        return Err(CliError::Config(format!(
            "config file not found: {}",
            args.config.display()
        )));
    }

    let generator = Generator::from_config(&args.config)?;
    let renderer = generator.default_renderer();

    let mut database = Database::connect(&args.db_url)?;
    let path = generator.generate(database.snapshot(), &renderer)?;

    success(&format!("Generated {}", path.display()));
    Ok(path)
}
