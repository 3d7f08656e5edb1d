//! Lifecycle observers.
//!
//! The engine reports every step of a run through a single
//! [`MigrationObserver`]. All methods default to no-ops, so an observer only
//! implements the events it cares about. Several observers are combined with
//! [`CompositeObserver`].

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::migration::Migration;
use crate::warning::MigrationWarning;

/// Receives lifecycle events from the migration engine.
///
/// Observers cannot influence the run: a failing migration still aborts the
/// transaction regardless of what an observer does.
pub trait MigrationObserver {
    /// A run is starting with `count` migrations.
    fn on_begin(&self, _count: usize) {}

    /// The engine is about to check for the ledger table.
    fn on_check_table(&self) {}

    /// The ledger table check completed; `created` is true if it was created.
    fn on_table_checked(&self, _created: bool) {}

    /// A migration is about to be looked up and possibly applied.
    fn on_before_migration(&self, _migration: &dyn Migration) {}

    /// A migration has been handled.
    fn on_after_migration(
        &self,
        _migration: &dyn Migration,
        _applied: bool,
        _warning: Option<&MigrationWarning>,
        _fixed: bool,
    ) {
    }

    /// The run committed.
    fn on_finish(&self, _skipped: usize, _warned: usize, _applied: usize, _elapsed: Duration) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}

impl<T: MigrationObserver + ?Sized> MigrationObserver for Box<T> {
    fn on_begin(&self, count: usize) {
        (**self).on_begin(count)
    }

    fn on_check_table(&self) {
        (**self).on_check_table()
    }

    fn on_table_checked(&self, created: bool) {
        (**self).on_table_checked(created)
    }

    fn on_before_migration(&self, migration: &dyn Migration) {
        (**self).on_before_migration(migration)
    }

    fn on_after_migration(
        &self,
        migration: &dyn Migration,
        applied: bool,
        warning: Option<&MigrationWarning>,
        fixed: bool,
    ) {
        (**self).on_after_migration(migration, applied, warning, fixed)
    }

    fn on_finish(&self, skipped: usize, warned: usize, applied: usize, elapsed: Duration) {
        (**self).on_finish(skipped, warned, applied, elapsed)
    }
}

/// Forwards every event to each child observer in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn MigrationObserver>>,
}

impl CompositeObserver {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn with(mut self, observer: impl MigrationObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Add an observer in place.
    pub fn push(&mut self, observer: impl MigrationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Number of child observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether there are no child observers.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl MigrationObserver for CompositeObserver {
    fn on_begin(&self, count: usize) {
        self.observers.iter().for_each(|o| o.on_begin(count));
    }

    fn on_check_table(&self) {
        self.observers.iter().for_each(|o| o.on_check_table());
    }

    fn on_table_checked(&self, created: bool) {
        self.observers.iter().for_each(|o| o.on_table_checked(created));
    }

    fn on_before_migration(&self, migration: &dyn Migration) {
        self.observers
            .iter()
            .for_each(|o| o.on_before_migration(migration));
    }

    fn on_after_migration(
        &self,
        migration: &dyn Migration,
        applied: bool,
        warning: Option<&MigrationWarning>,
        fixed: bool,
    ) {
        self.observers
            .iter()
            .for_each(|o| o.on_after_migration(migration, applied, warning, fixed));
    }

    fn on_finish(&self, skipped: usize, warned: usize, applied: usize, elapsed: Duration) {
        self.observers
            .iter()
            .for_each(|o| o.on_finish(skipped, warned, applied, elapsed));
    }
}

/// Emits every lifecycle event as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MigrationObserver for TracingObserver {
    fn on_begin(&self, count: usize) {
        info!(count, "starting migrations");
    }

    fn on_table_checked(&self, created: bool) {
        debug!(created, "ledger table checked");
    }

    fn on_before_migration(&self, migration: &dyn Migration) {
        debug!(migration = %migration.name(), hash = %migration.hash(), "processing migration");
    }

    fn on_after_migration(
        &self,
        migration: &dyn Migration,
        applied: bool,
        warning: Option<&MigrationWarning>,
        fixed: bool,
    ) {
        match warning {
            Some(warning) => warn!(
                migration = %migration.name(),
                fixed,
                "{}",
                warning.describe()
            ),
            None if applied => info!(migration = %migration.name(), "applied migration"),
            None => debug!(migration = %migration.name(), "skipped migration"),
        }
    }

    fn on_finish(&self, skipped: usize, warned: usize, applied: usize, elapsed: Duration) {
        info!(
            skipped,
            warned,
            applied,
            elapsed_ms = elapsed.as_millis() as u64,
            "migrations complete"
        );
    }
}
