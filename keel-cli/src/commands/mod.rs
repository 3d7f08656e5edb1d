//! CLI command implementations.

pub mod generate;
pub mod migrate;
pub mod new;
pub mod version;
