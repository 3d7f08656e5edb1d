//! Drift warnings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const HASH_DISPLAY_LEN: usize = 8;

/// Discrepancy between a migration's current identity and what the ledger
/// recorded when it was applied.
///
/// Drift never fails a run. It is reported to observers and, in fix mode,
/// written back to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationWarning {
    /// The content hash changed since the migration was applied.
    HashDiffers {
        /// Hash recorded in the ledger.
        old: String,
        /// Hash of the migration now.
        new: String,
        /// When the recorded application happened.
        applied_at: DateTime<Utc>,
    },
    /// The migration now follows a different predecessor.
    ParentDiffers {
        /// Parent recorded in the ledger.
        old: Option<String>,
        /// Parent in the current run.
        new: Option<String>,
        /// When the recorded application happened.
        applied_at: DateTime<Utc>,
    },
}

impl MigrationWarning {
    /// Human readable description of the drift.
    pub fn describe(&self) -> String {
        match self {
            Self::HashDiffers {
                old,
                new,
                applied_at,
            } => format!(
                "hash '{}' differs from previous application of the migration at {} with hash '{}'",
                truncate_hash(new),
                applied_at,
                truncate_hash(old)
            ),
            Self::ParentDiffers {
                old,
                new,
                applied_at,
            } => format!(
                "parent {} differs from previous application of the migration at {} with parent {}",
                display_parent(new.as_deref()),
                applied_at,
                display_parent(old.as_deref())
            ),
        }
    }

    /// When the drifted migration was originally applied.
    pub fn applied_at(&self) -> DateTime<Utc> {
        match self {
            Self::HashDiffers { applied_at, .. } | Self::ParentDiffers { applied_at, .. } => {
                *applied_at
            }
        }
    }

    /// Whether this is a hash drift.
    pub fn is_hash(&self) -> bool {
        matches!(self, Self::HashDiffers { .. })
    }

    /// Whether this is a parent drift.
    pub fn is_parent(&self) -> bool {
        matches!(self, Self::ParentDiffers { .. })
    }
}

impl fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn truncate_hash(hash: &str) -> String {
    match hash.char_indices().nth(HASH_DISPLAY_LEN) {
        Some((idx, _)) => format!("{}...", &hash[..idx]),
        None => hash.to_string(),
    }
}

fn display_parent(parent: Option<&str>) -> String {
    match parent {
        Some(name) => format!("'{}'", name),
        None => "None".to_string(),
    }
}
