//! Console observers for `keel migrate`.
//!
//! | verbosity | output                                         |
//! |-----------|------------------------------------------------|
//! | 0         | nothing                                        |
//! | 1         | warnings                                       |
//! | 2         | start message, warnings, summary               |
//! | 3+        | start message, per-migration progress, summary |

use std::time::Duration;

use keel_migrate::{CompositeObserver, Migration, MigrationObserver, MigrationWarning, TracingObserver};

use crate::output::{Console, format_duration};

/// Prints `warning: <name> <description>` for drifted migrations.
pub struct WarningObserver {
    console: Console,
}

impl MigrationObserver for WarningObserver {
    fn on_after_migration(
        &self,
        migration: &dyn Migration,
        _applied: bool,
        warning: Option<&MigrationWarning>,
        fixed: bool,
    ) {
        if let Some(warning) = warning {
            let mut text = format!("warning: {} {}", migration.name(), warning.describe());
            if fixed {
                text.push_str(" (fixed)");
            }
            self.console.line(&self.console.style().warning(&text));
        }
    }
}

/// Prints the start message and the run summary.
pub struct SummaryObserver {
    console: Console,
}

impl MigrationObserver for SummaryObserver {
    fn on_begin(&self, count: usize) {
        let style = self.console.style();
        self.console
            .line(&style.progress(&format!("Starting {} migrations...", count)));
    }

    fn on_finish(&self, skipped: usize, warned: usize, applied: usize, elapsed: Duration) {
        let style = self.console.style();
        self.console
            .line(&style.progress(&format!("Completed in {}", format_duration(elapsed))));
        self.console.line(&format!(
            "{}, {}, {}",
            style.skipped(&format!("{} skipped", skipped)),
            style.warning(&format!("{} warnings", warned)),
            style.applied(&format!("{} applied", applied)),
        ));
    }
}

/// Prints `applying <name>...applied|skipped` for every migration.
pub struct ProgressObserver {
    console: Console,
}

impl MigrationObserver for ProgressObserver {
    fn on_before_migration(&self, migration: &dyn Migration) {
        self.console.print(&format!("applying {}...", migration.name()));
    }

    fn on_after_migration(
        &self,
        _migration: &dyn Migration,
        applied: bool,
        warning: Option<&MigrationWarning>,
        fixed: bool,
    ) {
        self.console.line(if applied { "applied" } else { "skipped" });
        if let Some(warning) = warning {
            let mut text = format!("warning: {}", warning.describe());
            if fixed {
                text.push_str(" (fixed)");
            }
            self.console.line(&self.console.style().warning(&text));
        }
    }
}

/// Build the observer for a verbosity level.
///
/// A [`TracingObserver`] is always included; it is silent unless logging
/// has been enabled.
pub fn for_verbosity(verbosity: u8, console: &Console) -> CompositeObserver {
    let observer = CompositeObserver::new().with(TracingObserver);
    match verbosity {
        0 => observer,
        1 => observer.with(WarningObserver {
            console: console.clone(),
        }),
        2 => observer
            .with(SummaryObserver {
                console: console.clone(),
            })
            .with(WarningObserver {
                console: console.clone(),
            }),
        _ => observer
            .with(SummaryObserver {
                console: console.clone(),
            })
            .with(ProgressObserver {
                console: console.clone(),
            }),
    }
}
