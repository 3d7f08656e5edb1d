//! keel CLI - command-line interface for keel migrations and model generation.
//!
//! ```text
//! keel migrate sqlite:app.db -m 'migrations/*.sql' -vv
//! keel new 0004_add_index "index posts by author" -o migrations
//! keel generate keel.toml postgres://localhost/app
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("keel-cli needs at least one of the `sqlite` or `postgres` features");

pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod logging;
pub mod observer;
pub mod output;
