//! `keel version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the version command
pub fn run() -> CliResult<()> {
    output::section("keel");
    output::newline();

    kv("Version", VERSION);
    kv("Binary", NAME);

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);

    let mut drivers = Vec::new();

    #[cfg(feature = "sqlite")]
    drivers.push("sqlite");

    #[cfg(feature = "postgres")]
    drivers.push("postgres");

    kv("Drivers", &drivers.join(", "));

    output::newline();
    output::dim("https://github.com/keel-rs/keel");

    Ok(())
}
