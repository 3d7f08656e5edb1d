//! keel CLI - command-line interface for keel migrations and model generation.

use clap::Parser;

use keel_cli::cli::{Cli, Command};
use keel_cli::commands;
use keel_cli::error::CliResult;
use keel_cli::{logging, output};

fn main() {
    logging::init();

    if let Err(e) = run() {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => commands::migrate::run(args).map(|_| ()),
        Command::New(args) => commands::new::run(args).map(|_| ()),
        Command::Generate(args) => commands::generate::run(args).map(|_| ()),
        Command::Version => commands::version::run(),
    }
}
