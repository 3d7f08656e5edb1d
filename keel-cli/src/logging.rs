//! Logging setup for the `keel` binary.
//!
//! # Environment Variables
//!
//! - `KEEL_DEBUG=true|1|yes` - Enable debug logging
//! - `KEEL_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific log level
//! - `KEEL_LOG_FORMAT=json|pretty|compact` - Set output format (default: compact)
//!
//! Without `KEEL_DEBUG` or `KEEL_LOG_LEVEL` no subscriber is installed.
//! Logs go to stderr so they never mix with command output.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Crates whose events are shown.
const TARGETS: [&str; 6] = [
    "keel",
    "keel_cli",
    "keel_migrate",
    "keel_codegen",
    "keel_sqlite",
    "keel_postgres",
];

/// Check if debug logging is enabled via `KEEL_DEBUG`.
pub fn is_debug_enabled() -> bool {
    env::var("KEEL_DEBUG")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: Option<&str>, debug: bool) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug => "debug",
        _ => "warn",
    }
}

fn parse_format(value: Option<&str>) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("json") => "json",
        Some("pretty") => "pretty",
        _ => "compact",
    }
}

/// Level from `KEEL_LOG_LEVEL`, falling back to `debug` or `warn`.
pub fn get_log_level() -> &'static str {
    parse_level(env::var("KEEL_LOG_LEVEL").ok().as_deref(), is_debug_enabled())
}

/// Format from `KEEL_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    parse_format(env::var("KEEL_LOG_FORMAT").ok().as_deref())
}

fn filter_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("KEEL_LOG_LEVEL").is_err() {
            return;
        }

        let level = get_log_level();
        let filter =
            EnvFilter::try_new(filter_directives(level)).unwrap_or_else(|_| EnvFilter::new("warn"));

        let registry = tracing_subscriber::registry().with(filter);
        let format = get_log_format();
        match format {
            "json" => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
            "pretty" => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init(),
            _ => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init(),
        }

        tracing::debug!(level, format, "keel logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("TRACE"), false), "trace");
        assert_eq!(parse_level(Some("bogus"), false), "warn");
        assert_eq!(parse_level(Some("bogus"), true), "debug");
        assert_eq!(parse_level(None, true), "debug");
        assert_eq!(parse_level(None, false), "warn");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format(Some("json")), "json");
        assert_eq!(parse_format(Some("Pretty")), "pretty");
        assert_eq!(parse_format(None), "compact");
    }

    #[test]
    fn test_filter_directives() {
        let directives = filter_directives("info");
        assert!(directives.starts_with("keel=info,keel_cli=info"));
        assert!(directives.contains("keel_postgres=info"));
    }
}
