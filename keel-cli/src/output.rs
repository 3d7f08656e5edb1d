//! Styled terminal output utilities.

use std::cell::RefCell;
use std::io::{IsTerminal, Write};
use std::rc::Rc;
use std::time::Duration;

use owo_colors::OwoColorize;

use crate::cli::ColorChoice;

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Applies colors only when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styler {
    enabled: bool,
}

impl Styler {
    /// Resolve a color choice against stdout.
    pub fn new(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stdout().is_terminal(),
        };
        Self { enabled }
    }

    /// A styler that never colors.
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    /// Whether colors are emitted.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Bold yellow, for warnings.
    pub fn warning(&self, text: &str) -> String {
        if self.enabled {
            text.yellow().bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Cyan, for run progress.
    pub fn progress(&self, text: &str) -> String {
        if self.enabled {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    /// Blue, for skipped counts.
    pub fn skipped(&self, text: &str) -> String {
        if self.enabled {
            text.blue().to_string()
        } else {
            text.to_string()
        }
    }

    /// Green, for applied counts.
    pub fn applied(&self, text: &str) -> String {
        if self.enabled {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }
}

/// A shared output stream with a styler.
///
/// Observers receive `&self`, so writes go through a `RefCell`. Write errors
/// are ignored in the same way `println!` output would be lost.
#[derive(Clone)]
pub struct Console {
    out: Rc<RefCell<dyn Write>>,
    styler: Styler,
}

impl Console {
    /// Console writing to stdout.
    pub fn stdout(styler: Styler) -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())), styler)
    }

    /// Console writing to an arbitrary stream.
    pub fn new(out: Rc<RefCell<dyn Write>>, styler: Styler) -> Self {
        Self { out, styler }
    }

    /// The styler.
    pub fn style(&self) -> &Styler {
        &self.styler
    }

    /// Write a full line.
    pub fn line(&self, text: &str) {
        let _ = writeln!(self.out.borrow_mut(), "{}", text);
    }

    /// Write text without a line break and flush.
    pub fn print(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        let _ = write!(out, "{}", text);
        let _ = out.flush();
    }
}

/// Format a duration as `1h2m3.5s`, `12.345ms`, `7us`, `3ns` or `0s`.
///
/// Fractions are printed with at most three decimals, trailing zeros removed.
pub fn format_duration(duration: Duration) -> String {
    let mut elapsed = duration.as_secs_f64();

    if elapsed > 1.0 {
        let mut out = String::new();
        if elapsed > 3600.0 {
            let hours = (elapsed / 3600.0).floor();
            elapsed -= hours * 3600.0;
            out.push_str(&format!("{}h", hours as u64));
        }
        if !out.is_empty() || elapsed > 60.0 {
            let minutes = (elapsed / 60.0).floor();
            elapsed -= minutes * 60.0;
            out.push_str(&format!("{}m", minutes as u64));
        }
        out.push_str(&trim_float(elapsed));
        out.push('s');
        return out;
    }

    let ms = elapsed * 1e3;
    let us = elapsed * 1e6;
    let ns = elapsed * 1e9;
    if ms > 1.0 {
        format!("{}ms", trim_float(ms))
    } else if us > 1.0 {
        format!("{}us", trim_float(us))
    } else if ns > 1.0 {
        format!("{}ns", trim_float(ns))
    } else {
        "0s".to_string()
    }
}

fn trim_float(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(3723_500)), "1h2m3.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_micros(12_345)), "12.345ms");
        assert_eq!(format_duration(Duration::from_micros(7)), "7us");
        assert_eq!(format_duration(Duration::from_nanos(3)), "3ns");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_trim_float() {
        assert_eq!(trim_float(1.0), "1");
        assert_eq!(trim_float(1.2344), "1.234");
        assert_eq!(trim_float(10.5), "10.5");
    }

    #[test]
    fn test_plain_styler_leaves_text() {
        let styler = Styler::new(ColorChoice::Never);
        assert!(!styler.enabled());
        assert_eq!(styler.warning("warn"), "warn");

        let styler = Styler::new(ColorChoice::Always);
        assert_ne!(styler.applied("3 applied"), "3 applied");
    }

    #[test]
    fn test_console_writes_to_buffer() {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let console = Console::new(buffer.clone(), Styler::plain());
        console.print("applying a...");
        console.line("applied");
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "applying a...applied\n");
    }
}
