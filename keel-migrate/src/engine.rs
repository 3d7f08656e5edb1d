//! Migration engine implementation.
//!
//! A run applies an ordered list of [`Migration`]s inside one transaction.
//! Each unit is looked up in the [`Ledger`]: unknown units are executed and
//! recorded, known units are skipped, and known units whose hash or parent
//! changed produce a [`MigrationWarning`] (and, in fix mode, a ledger update).

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{MigrateResult, MigrationError};
use crate::ledger::{Ledger, LedgerRecord, is_valid_table_name};
use crate::migration::Migration;
use crate::observer::{MigrationObserver, NoopObserver};
use crate::warning::MigrationWarning;

/// Configuration for the migration engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Name of the ledger table.
    pub table_name: String,
    /// Column type used for every ledger column.
    pub text_type: String,
    /// Whether drift is written back to the ledger.
    pub fix_warnings: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            table_name: "migrations".to_string(),
            text_type: "TEXT".to_string(),
            fix_warnings: false,
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ledger table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Set the text column type of the ledger table.
    pub fn text_type(mut self, text_type: impl Into<String>) -> Self {
        self.text_type = text_type.into();
        self
    }

    /// Enable or disable fix mode.
    pub fn fix_warnings(mut self, fix: bool) -> Self {
        self.fix_warnings = fix;
        self
    }

    /// Check that the configured identifiers are safe to splice into SQL.
    pub fn validate(&self) -> MigrateResult<()> {
        if !is_valid_table_name(&self.table_name) {
            return Err(MigrationError::invalid_config(format!(
                "invalid ledger table name '{}'",
                self.table_name
            )));
        }
        let text_type_ok = !self.text_type.trim().is_empty()
            && self
                .text_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')'));
        if !text_type_ok {
            return Err(MigrationError::invalid_config(format!(
                "invalid text type '{}'",
                self.text_type
            )));
        }
        Ok(())
    }
}

/// What happened to one migration during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Executed and recorded.
    Applied,
    /// Already recorded with a matching hash and parent.
    Skipped,
    /// Already recorded, but drifted.
    Warned {
        /// The drift that was detected.
        warning: MigrationWarning,
        /// Whether the ledger was corrected.
        fixed: bool,
    },
}

/// Outcome of a single migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Migration name.
    pub name: String,
    /// What happened to it.
    pub status: MigrationStatus,
}

/// Result of one engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationResult {
    /// Units already recorded and unchanged.
    pub skipped: usize,
    /// Units already recorded but drifted.
    pub warned: usize,
    /// Units executed during this run.
    pub applied: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
    /// Per-unit outcomes, in run order.
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationResult {
    /// Counts as `(skipped, warned, applied)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.skipped, self.warned, self.applied)
    }

    /// Warnings raised during the run, with the migration they belong to.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &MigrationWarning, bool)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            MigrationStatus::Warned { warning, fixed } => {
                Some((outcome.name.as_str(), warning, *fixed))
            }
            _ => None,
        })
    }

    /// Whether nothing was applied and nothing drifted.
    pub fn is_noop(&self) -> bool {
        self.applied == 0 && self.warned == 0
    }

    /// One-line summary of the counts.
    pub fn summary(&self) -> String {
        format!(
            "{} skipped, {} warned, {} applied",
            self.skipped, self.warned, self.applied
        )
    }
}

impl fmt::Display for MigrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Compare a ledger record with a unit's current identity.
///
/// The hash is compared first; the parent is only considered when the hashes
/// match.
pub fn classify(
    record: &LedgerRecord,
    hash: &str,
    parent: Option<&str>,
) -> Option<MigrationWarning> {
    if record.hash != hash {
        return Some(MigrationWarning::HashDiffers {
            old: record.hash.clone(),
            new: hash.to_string(),
            applied_at: record.applied_at,
        });
    }
    if record.parent.as_deref() != parent {
        return Some(MigrationWarning::ParentDiffers {
            old: record.parent.clone(),
            new: parent.map(str::to_string),
            applied_at: record.applied_at,
        });
    }
    None
}

/// The migration engine.
pub struct MigrationEngine {
    config: MigrationConfig,
    ledger: Ledger,
    observer: Box<dyn MigrationObserver>,
}

impl MigrationEngine {
    /// Create an engine with no observer.
    pub fn new(config: MigrationConfig) -> Self {
        let ledger = Ledger::new(&config.table_name, &config.text_type);
        Self {
            config,
            ledger,
            observer: Box::new(NoopObserver),
        }
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: impl MigrationObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// The ledger the engine writes to.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply `migrations` in order.
    ///
    /// The whole run is one transaction. Any error rolls it back and is
    /// returned unchanged; drift never fails the run.
    pub fn migrate<M: Migration>(
        &self,
        conn: &mut dyn Connection,
        migrations: &[M],
    ) -> MigrateResult<MigrationResult> {
        self.config.validate()?;

        let started = Instant::now();
        self.observer.on_begin(migrations.len());

        conn.begin()?;
        match self.run(conn, migrations) {
            Ok(mut result) => {
                if let Err(err) = conn.commit() {
                    if let Err(rollback_err) = conn.rollback() {
                        warn!(error = %rollback_err, "rollback failed");
                    }
                    return Err(err);
                }
                result.elapsed = started.elapsed();
                self.observer.on_finish(
                    result.skipped,
                    result.warned,
                    result.applied,
                    result.elapsed,
                );
                info!(
                    skipped = result.skipped,
                    warned = result.warned,
                    applied = result.applied,
                    "migration run committed"
                );
                Ok(result)
            }
            Err(err) => {
                if let Err(rollback_err) = conn.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    fn run<M: Migration>(
        &self,
        conn: &mut dyn Connection,
        migrations: &[M],
    ) -> MigrateResult<MigrationResult> {
        self.observer.on_check_table();
        let created = self.ledger.ensure_table(conn)?;
        self.observer.on_table_checked(created);

        let mut result = MigrationResult::default();
        let mut parent: Option<&str> = None;

        for migration in migrations {
            let status = self.step(conn, migration, parent)?;
            match &status {
                MigrationStatus::Applied => result.applied += 1,
                MigrationStatus::Skipped => result.skipped += 1,
                MigrationStatus::Warned { .. } => result.warned += 1,
            }
            result.outcomes.push(MigrationOutcome {
                name: migration.name().to_string(),
                status,
            });
            parent = Some(migration.name());
        }

        Ok(result)
    }

    fn step(
        &self,
        conn: &mut dyn Connection,
        migration: &dyn Migration,
        parent: Option<&str>,
    ) -> MigrateResult<MigrationStatus> {
        let name = migration.name();
        let hash = migration.hash();
        self.observer.on_before_migration(migration);

        let Some(record) = self.ledger.get(conn, name)? else {
            debug!(migration = %name, "applying migration");
            migration
                .execute(conn)
                .map_err(|e| MigrationError::execution(name, e))?;
            self.ledger.insert(
                conn,
                &LedgerRecord::now(name, parent.map(str::to_string), hash),
            )?;
            self.observer.on_after_migration(migration, true, None, false);
            return Ok(MigrationStatus::Applied);
        };

        let Some(warning) = classify(&record, hash, parent) else {
            self.observer.on_after_migration(migration, false, None, false);
            return Ok(MigrationStatus::Skipped);
        };

        let fixed = self.config.fix_warnings;
        if fixed {
            match &warning {
                MigrationWarning::HashDiffers { .. } => {
                    self.ledger.update_hash(conn, name, hash)?
                }
                MigrationWarning::ParentDiffers { .. } => {
                    self.ledger.update_parent(conn, name, parent)?
                }
            }
        }
        self.observer
            .on_after_migration(migration, false, Some(&warning), fixed);
        Ok(MigrationStatus::Warned { warning, fixed })
    }
}

impl fmt::Debug for MigrationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
