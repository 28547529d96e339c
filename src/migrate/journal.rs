//! Migration Journal
//!
//! Ordered record of applied migrations, persisted as a single JSON file
//! (`.migrations.json`) at the catalog root with 2-space indentation.
//! The journal is only written after a successful catalog write, so a
//! failed migration never leaves it claiming work that did not happen.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::migrate::JOURNAL_VERSION;
use crate::types::{Result, ResultExt};

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigration {
    pub id: String,
    pub applied_at: DateTime<Utc>,
    /// 16-hex truncated SHA-256 of the script at apply time
    pub checksum: String,
    pub migrator_version: u32,
}

/// The persisted journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationState {
    pub version: u32,
    pub applied: Vec<AppliedMigration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

impl Default for MigrationState {
    fn default() -> Self {
        Self {
            version: JOURNAL_VERSION,
            applied: Vec::new(),
            last_run: None,
        }
    }
}

impl MigrationState {
    /// Load the journal, or initialize an empty one when the file does
    /// not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).migration_context("journal")?;
        serde_json::from_str(&content).parse_context(path.display().to_string())
    }

    /// Persist with 2-space indentation and a trailing newline.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut encoded = serde_json::to_string_pretty(self).migration_context("journal")?;
        encoded.push('\n');
        std::fs::write(path, encoded).migration_context("journal")
    }

    pub fn is_applied(&self, id: &str) -> bool {
        self.applied.iter().any(|entry| entry.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_journal_initializes_empty() {
        let temp = TempDir::new().unwrap();
        let state = MigrationState::load(&temp.path().join(".migrations.json")).unwrap();
        assert_eq!(state.version, JOURNAL_VERSION);
        assert!(state.applied.is_empty());
        assert!(state.last_run.is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".migrations.json");

        let mut state = MigrationState::default();
        state.applied.push(AppliedMigration {
            id: "001-add-tags".to_string(),
            applied_at: Utc::now(),
            checksum: "deadbeefdeadbeef".to_string(),
            migrator_version: 1,
        });
        state.last_run = Some(Utc::now());
        state.save(&path).unwrap();

        let loaded = MigrationState::load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_wire_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".migrations.json");

        let mut state = MigrationState::default();
        state.applied.push(AppliedMigration {
            id: "001-add-tags".to_string(),
            applied_at: "2026-01-15T10:00:00Z".parse().unwrap(),
            checksum: "deadbeefdeadbeef".to_string(),
            migrator_version: 1,
        });
        state.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": 1"));
        assert!(raw.contains("\"appliedAt\""));
        assert!(raw.contains("\"migratorVersion\": 1"));
        // 2-space indentation, no lastRun key when unset.
        assert!(raw.contains("\n  \"applied\""));
        assert!(!raw.contains("lastRun"));
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_corrupt_journal_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".migrations.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = MigrationState::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::types::ErrorKind::Parse);
    }

    #[test]
    fn test_is_applied() {
        let mut state = MigrationState::default();
        assert!(!state.is_applied("001-add-tags"));
        state.applied.push(AppliedMigration {
            id: "001-add-tags".to_string(),
            applied_at: Utc::now(),
            checksum: "0".repeat(16),
            migrator_version: 1,
        });
        assert!(state.is_applied("001-add-tags"));
    }
}
