//! Migration Scripts
//!
//! A migration is a pair of pure transforms (`up`, `down`) over a parsed
//! category document, plus a definition carrying its ordering id and an
//! optional category whitelist. Scripts are compiled code registered on
//! the migrator; each transform carries a stable source text that feeds
//! the integrity checksum.

use std::sync::Arc;

use serde_yaml::Value;
use sha2::{Digest, Sha256};

use crate::constants::migrate::CHECKSUM_HEX_LEN;
use crate::types::Result;

/// Pure transform over one parsed category document.
pub type Transform = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Identifying metadata for a migration. The `id` is the ordering key:
/// migrations run in lexicographic id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationDefinition {
    pub id: String,
    pub description: String,
    /// When present, only documents whose `id` is listed are touched
    pub target_categories: Option<Vec<String>>,
}

/// One registered migration.
#[derive(Clone)]
pub struct MigrationScript {
    pub definition: MigrationDefinition,
    pub up: Transform,
    pub down: Transform,
    /// Stable textual form of the up transform, checksummed
    pub up_source: String,
    /// Stable textual form of the down transform, checksummed
    pub down_source: String,
}

impl std::fmt::Debug for MigrationScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationScript")
            .field("definition", &self.definition)
            .field("up_source", &self.up_source)
            .field("down_source", &self.down_source)
            .finish()
    }
}

impl MigrationScript {
    /// New script with identity transforms; attach real ones with
    /// [`with_up`](Self::with_up) and [`with_down`](Self::with_down).
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            definition: MigrationDefinition {
                id: id.into(),
                description: description.into(),
                target_categories: None,
            },
            up: Arc::new(Ok),
            down: Arc::new(Ok),
            up_source: "identity".to_string(),
            down_source: "identity".to_string(),
        }
    }

    /// Restrict the migration to the listed category ids.
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.definition.target_categories = Some(targets);
        self
    }

    pub fn with_up<F>(mut self, source: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.up = Arc::new(transform);
        self.up_source = source.into();
        self
    }

    pub fn with_down<F>(mut self, source: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.down = Arc::new(transform);
        self.down_source = source.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Whether this migration touches the given category document.
    pub fn applies_to(&self, category_id: &str) -> bool {
        match &self.definition.target_categories {
            Some(targets) => targets.iter().any(|t| t == category_id),
            None => true,
        }
    }

    /// Integrity checksum over `{id, description, up_source,
    /// down_source}`: SHA-256, truncated to 16 hex characters.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.definition.id.as_bytes());
        hasher.update([0]);
        hasher.update(self.definition.description.as_bytes());
        hasher.update([0]);
        hasher.update(self.up_source.as_bytes());
        hasher.update([0]);
        hasher.update(self.down_source.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..CHECKSUM_HEX_LEN].to_string()
    }
}
