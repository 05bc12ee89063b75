//! Backup snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::UserSettings;
use super::recipe::Recipe;

/// An immutable catalog snapshot. Backups are append-only: created, listed,
/// restored from, or deleted whole, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub recipes: Vec<Recipe>,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

impl Backup {
    pub fn new(recipes: Vec<Recipe>, settings: UserSettings) -> Self {
        Self {
            recipes,
            settings,
            created_at: Utc::now(),
        }
    }
}

/// Listing entry for a stored backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
}
