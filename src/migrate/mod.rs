//! Category Migrator
//!
//! Evolves the on-disk YAML catalog through an ordered sequence of
//! migrations while maintaining a journal (`.migrations.json`). The
//! migrator is single-writer: a cooperative `fs2` lock on the catalog
//! guards against two migrators running over the same tree. It never
//! runs during a scan.
//!
//! The journal is updated only after a successful catalog write, so a
//! failed transform or write never leaves it claiming work that did not
//! happen.

mod journal;
mod script;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::constants::migrate::{
    JOURNAL_FILE_NAME, LOCK_FILE_NAME, MIGRATIONS_DIR_NAME, MIGRATOR_VERSION,
};
use crate::store::yaml_files;
use crate::types::{Domain, PinataError, Result, ResultExt};

pub use journal::{AppliedMigration, MigrationState};
pub use script::{MigrationDefinition, MigrationScript, Transform};

// =============================================================================
// Options & Outcomes
// =============================================================================

/// Options for [`CategoryMigrator::migrate`].
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Report changes without writing files or the journal
    pub dry_run: bool,
    /// Abort the run after the first file-level failure
    pub stop_on_error: bool,
    /// Run pending migrations up to and including this id
    pub up_to: Option<String>,
    /// Restrict to these category ids (empty = all)
    pub categories: Vec<String>,
    /// Restrict to these domains (empty = all)
    pub domains: Vec<Domain>,
}

/// Options for [`CategoryMigrator::rollback`].
#[derive(Debug, Clone)]
pub struct RollbackOptions {
    /// How many journal entries to roll back from the tail
    pub count: usize,
    /// Roll back down to, but not including, this id
    pub to_id: Option<String>,
    pub dry_run: bool,
}

impl Default for RollbackOptions {
    fn default() -> Self {
        Self {
            count: 1,
            to_id: None,
            dry_run: false,
        }
    }
}

/// One file-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    pub migration_id: String,
    pub path: Option<String>,
    pub message: String,
}

/// Per-migration outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct MigrationRunResult {
    pub migration_id: String,
    /// Files rewritten (or, in a dry run, that would be rewritten)
    pub changed_files: Vec<String>,
    /// Files whose document the migration did not alter
    pub unchanged_files: usize,
    /// Files excluded by target or option filters
    pub skipped_files: usize,
    pub failures: Vec<MigrationFailure>,
    pub dry_run: bool,
}

/// Outcome of a [`CategoryMigrator::migrate`] run.
#[derive(Debug, Clone, Default)]
pub struct MigrateOutcome {
    pub results: Vec<MigrationRunResult>,
    /// True when `stop_on_error` aborted the run early
    pub aborted: bool,
}

/// Outcome of a [`CategoryMigrator::rollback`] run.
#[derive(Debug, Clone, Default)]
pub struct RollbackOutcome {
    pub results: Vec<MigrationRunResult>,
}

/// One integrity problem found by [`CategoryMigrator::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    ChecksumMismatch {
        migration_id: String,
        expected: String,
        actual: String,
    },
    MissingScript { migration_id: String },
}

/// Report from [`CategoryMigrator::verify`]. Verification never mutates
/// state and always succeeds; problems are data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checked: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

// =============================================================================
// Catalog Lock
// =============================================================================

/// Cooperative exclusive lock over the catalog tree, released on drop.
struct CatalogLock {
    file: std::fs::File,
}

impl CatalogLock {
    fn acquire(catalog_dir: &Path) -> Result<Self> {
        let path = catalog_dir.join(LOCK_FILE_NAME);
        let file = std::fs::File::create(&path).migration_context("lock")?;
        file.try_lock_exclusive().map_err(|_| {
            PinataError::migration(format!(
                "another migrator holds the catalog lock at {}",
                path.display()
            ))
        })?;
        Ok(Self { file })
    }
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

// =============================================================================
// Migrator
// =============================================================================

/// Applies ordered, versioned transformations to the YAML catalog.
pub struct CategoryMigrator {
    catalog_dir: PathBuf,
    /// Registered scripts, ordered by id
    scripts: BTreeMap<String, MigrationScript>,
    journal: MigrationState,
    initialized: bool,
}

impl CategoryMigrator {
    pub fn new<P: Into<PathBuf>>(catalog_dir: P) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            scripts: BTreeMap::new(),
            journal: MigrationState::default(),
            initialized: false,
        }
    }

    /// Register a migration script. Duplicate ids are rejected.
    pub fn register(&mut self, script: MigrationScript) -> Result<()> {
        let id = script.id().to_string();
        if self.scripts.contains_key(&id) {
            return Err(PinataError::migration_for(id, "duplicate migration id"));
        }
        self.scripts.insert(id, script);
        Ok(())
    }

    /// Ensure the migrations directory exists and load the journal (or
    /// initialize an empty one).
    pub fn initialize(&mut self) -> Result<()> {
        if !self.catalog_dir.is_dir() {
            return Err(PinataError::migration(format!(
                "catalog directory does not exist: {}",
                self.catalog_dir.display()
            )));
        }
        let migrations_dir = self.catalog_dir.join(MIGRATIONS_DIR_NAME);
        if !migrations_dir.exists() {
            std::fs::create_dir_all(&migrations_dir).migration_context("initialize")?;
        }

        self.journal = MigrationState::load(&self.journal_path())?;
        self.initialized = true;
        debug!(
            scripts = self.scripts.len(),
            applied = self.journal.applied.len(),
            "migrator initialized"
        );
        Ok(())
    }

    fn journal_path(&self) -> PathBuf {
        self.catalog_dir.join(JOURNAL_FILE_NAME)
    }

    fn ensure_initialized(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialize()
    }

    pub fn get_applied(&self) -> &[AppliedMigration] {
        &self.journal.applied
    }

    pub fn get_pending(&self) -> Vec<&MigrationScript> {
        self.scripts
            .values()
            .filter(|script| !self.journal.is_applied(script.id()))
            .collect()
    }

    pub fn get_all(&self) -> Vec<&MigrationScript> {
        self.scripts.values().collect()
    }

    pub fn is_applied(&self, id: &str) -> bool {
        self.journal.is_applied(id)
    }

    /// Apply pending migrations in id order.
    pub fn migrate(&mut self, options: &MigrateOptions) -> Result<MigrateOutcome> {
        self.ensure_initialized()?;
        let _lock = CatalogLock::acquire(&self.catalog_dir)?;

        if let Some(up_to) = &options.up_to
            && !self.scripts.contains_key(up_to)
        {
            return Err(PinataError::not_found("migration", up_to));
        }

        let pending: Vec<String> = self
            .scripts
            .values()
            .filter(|script| !self.journal.is_applied(script.id()))
            .map(|script| script.id().to_string())
            .take_while(|id| match &options.up_to {
                Some(up_to) => id.as_str() <= up_to.as_str(),
                None => true,
            })
            .collect();

        let files = yaml_files(&self.catalog_dir)
            .map_err(|err| PinataError::migration(err.to_string()))?;
        let mut outcome = MigrateOutcome::default();

        for id in pending {
            let script = &self.scripts[&id];
            info!(migration = %id, dry_run = options.dry_run, "applying migration");

            let result = apply_over_catalog(
                script,
                Direction::Up,
                &files,
                Some(options),
                options.dry_run,
                options.stop_on_error,
            );
            let failed = !result.failures.is_empty();

            if !failed && !options.dry_run {
                self.journal.applied.push(AppliedMigration {
                    id: id.clone(),
                    applied_at: Utc::now(),
                    checksum: script.checksum(),
                    migrator_version: MIGRATOR_VERSION,
                });
                self.journal.last_run = Some(Utc::now());
                self.journal.save(&self.journal_path())?;
            }

            outcome.results.push(result);
            if failed && options.stop_on_error {
                warn!(migration = %id, "stopping run after file-level failure");
                outcome.aborted = true;
                break;
            }
        }

        Ok(outcome)
    }

    /// Roll back applied migrations from the journal tail.
    pub fn rollback(&mut self, options: &RollbackOptions) -> Result<RollbackOutcome> {
        self.ensure_initialized()?;
        let _lock = CatalogLock::acquire(&self.catalog_dir)?;

        let targets: Vec<String> = match &options.to_id {
            Some(to_id) => {
                if !self.journal.is_applied(to_id) {
                    return Err(PinataError::not_found("migration", to_id));
                }
                self.journal
                    .applied
                    .iter()
                    .rev()
                    .map(|entry| entry.id.clone())
                    .take_while(|id| id != to_id)
                    .collect()
            }
            None => self
                .journal
                .applied
                .iter()
                .rev()
                .take(options.count)
                .map(|entry| entry.id.clone())
                .collect(),
        };

        let files = yaml_files(&self.catalog_dir)
            .map_err(|err| PinataError::migration(err.to_string()))?;
        let mut outcome = RollbackOutcome::default();

        for id in targets {
            let Some(script) = self.scripts.get(&id) else {
                warn!(migration = %id, "script for journal entry is missing");
                outcome.results.push(MigrationRunResult {
                    migration_id: id.clone(),
                    failures: vec![MigrationFailure {
                        migration_id: id.clone(),
                        path: None,
                        message: "migration script no longer present".to_string(),
                    }],
                    dry_run: options.dry_run,
                    ..Default::default()
                });
                continue;
            };
            info!(migration = %id, dry_run = options.dry_run, "rolling back migration");

            let result =
                apply_over_catalog(script, Direction::Down, &files, None, options.dry_run, false);
            let failed = !result.failures.is_empty();

            if !failed && !options.dry_run {
                self.journal.applied.retain(|entry| entry.id != id);
                self.journal.save(&self.journal_path())?;
            }

            outcome.results.push(result);
        }

        Ok(outcome)
    }

    /// Recompute every journal entry's checksum against the registered
    /// scripts. Reports mismatches and missing scripts; mutates nothing.
    pub fn verify(&self) -> VerifyReport {
        let mut report = VerifyReport {
            checked: self.journal.applied.len(),
            ..Default::default()
        };

        for entry in &self.journal.applied {
            match self.scripts.get(&entry.id) {
                None => report.issues.push(IntegrityIssue::MissingScript {
                    migration_id: entry.id.clone(),
                }),
                Some(script) => {
                    let actual = script.checksum();
                    if actual != entry.checksum {
                        report.issues.push(IntegrityIssue::ChecksumMismatch {
                            migration_id: entry.id.clone(),
                            expected: entry.checksum.clone(),
                            actual,
                        });
                    }
                }
            }
        }

        report
    }
}

// =============================================================================
// Transform Application
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Apply one migration's transform to every category file, honoring the
/// script's target list and the run's category/domain filters. Identical
/// serialized output means the file is left untouched. With
/// `stop_on_error`, the file loop stops at the first failure.
fn apply_over_catalog(
    script: &MigrationScript,
    direction: Direction,
    files: &[PathBuf],
    filters: Option<&MigrateOptions>,
    dry_run: bool,
    stop_on_error: bool,
) -> MigrationRunResult {
    let mut result = MigrationRunResult {
        migration_id: script.id().to_string(),
        dry_run,
        ..Default::default()
    };

    for file in files {
        apply_to_file(script, direction, file, filters, dry_run, &mut result);
        if stop_on_error && !result.failures.is_empty() {
            break;
        }
    }

    result
}

fn apply_to_file(
    script: &MigrationScript,
    direction: Direction,
    file: &Path,
    filters: Option<&MigrateOptions>,
    dry_run: bool,
    result: &mut MigrationRunResult,
) {
    let display = file.display().to_string();
    let fail = |path: String, message: String, result: &mut MigrationRunResult| {
        result.failures.push(MigrationFailure {
            migration_id: script.id().to_string(),
            path: Some(path),
            message,
        });
    };

    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(err) => return fail(display, format!("read failed: {}", err), result),
    };
    let document: Value = match serde_yaml::from_str(&content) {
        Ok(document) => document,
        Err(err) => return fail(display, format!("parse failed: {}", err), result),
    };

    let Some(category_id) = document.get("id").and_then(Value::as_str) else {
        return fail(display, "document has no id".to_string(), result);
    };

    if !script.applies_to(category_id) || excluded_by_filters(&document, category_id, filters) {
        result.skipped_files += 1;
        return;
    }

    let transform = match direction {
        Direction::Up => &script.up,
        Direction::Down => &script.down,
    };
    let transformed = match transform(document.clone()) {
        Ok(transformed) => transformed,
        Err(err) => return fail(display, format!("transform failed: {}", err), result),
    };

    // Compare serialized forms; an unchanged document is a no-op and the
    // file is not rewritten.
    let original_serialized = match serde_yaml::to_string(&document) {
        Ok(serialized) => serialized,
        Err(err) => return fail(display, format!("serialize failed: {}", err), result),
    };
    let transformed_serialized = match serde_yaml::to_string(&transformed) {
        Ok(serialized) => serialized,
        Err(err) => return fail(display, format!("serialize failed: {}", err), result),
    };

    if transformed_serialized == original_serialized {
        result.unchanged_files += 1;
        return;
    }

    if dry_run {
        result.changed_files.push(display);
        return;
    }

    match std::fs::write(file, transformed_serialized) {
        Ok(()) => result.changed_files.push(display),
        Err(err) => fail(display, format!("write failed: {}", err), result),
    }
}

fn excluded_by_filters(
    document: &Value,
    category_id: &str,
    filters: Option<&MigrateOptions>,
) -> bool {
    let Some(options) = filters else {
        return false;
    };

    if !options.categories.is_empty() && !options.categories.iter().any(|id| id == category_id) {
        return true;
    }
    if !options.domains.is_empty() {
        let document_domain = document
            .get("domain")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<Domain>().ok());
        match document_domain {
            Some(domain) if options.domains.contains(&domain) => {}
            _ => return true,
        }
    }
    false
}

// =============================================================================
// Tests
// =============================================================================
