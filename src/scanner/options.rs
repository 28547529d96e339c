//! Scanner Options
//!
//! Option struct with defaults, `.pinataignore` resolution, and the
//! cooperative cancellation flag. User options merge over the defaults;
//! the ignore file at the scan root appends directory base names to
//! `exclude_dirs`.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::matcher::DEFAULT_MAX_FILE_SIZE;
use crate::constants::scanner::{DEFAULT_EXCLUDE_DIRS, DEFAULT_INCLUDE_EXTENSIONS, IGNORE_FILE_NAME};
use crate::types::{Confidence, Domain, PinataError, Result, Severity};

// =============================================================================
// Options
// =============================================================================

/// Options recognized by the scanner. Unknown keys in a config file are
/// rejected at extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerOptions {
    /// Directory base names skipped at any depth
    pub exclude_dirs: Vec<String>,
    /// File extensions (without dot) dispatched to the matcher
    pub include_extensions: Vec<String>,
    /// Files larger than this are skipped with a warning
    pub max_file_size: u64,
    /// Directory depth below the root to descend; -1 = unlimited
    pub max_depth: i32,
    /// Category id whitelist; empty = all
    pub category_ids: Vec<String>,
    /// Domain whitelist; empty = all
    pub domains: Vec<Domain>,
    /// Drop gaps less severe than this
    pub min_severity: Option<Severity>,
    /// Drop gaps less confident than this
    pub min_confidence: Option<Confidence>,
    /// Suppress gaps found in test files
    pub detect_test_files: bool,
    /// Additional test-file glob patterns
    pub test_file_patterns: Vec<String>,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            include_extensions: DEFAULT_INCLUDE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_depth: -1,
            category_ids: Vec::new(),
            domains: Vec::new(),
            min_severity: None,
            min_confidence: None,
            detect_test_files: true,
            test_file_patterns: Vec::new(),
        }
    }
}

impl ScannerOptions {
    /// Append `.pinataignore` entries from the scan root, if present.
    /// One directory base name per line; blank lines and `#` comments
    /// are ignored and a trailing `/` is stripped. A path (anything
    /// still containing a separator) is malformed.
    pub fn resolve(mut self, root: &Path) -> Result<Self> {
        let ignore_path = root.join(IGNORE_FILE_NAME);
        if !ignore_path.is_file() {
            return Ok(self);
        }

        let content = std::fs::read_to_string(&ignore_path).map_err(|err| {
            PinataError::config(format!("cannot read {}: {}", ignore_path.display(), err))
        })?;

        for (line_no, line) in content.lines().enumerate() {
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            let entry = entry.strip_suffix('/').unwrap_or(entry);
            if entry.contains('/') || entry.contains('\\') {
                return Err(PinataError::config(format!(
                    "{}:{}: '{}' is a path, expected a directory base name",
                    ignore_path.display(),
                    line_no + 1,
                    entry
                )));
            }
            if !self.exclude_dirs.iter().any(|d| d == entry) {
                debug!(entry, "excluding directory from ignore file");
                self.exclude_dirs.push(entry.to_string());
            }
        }

        Ok(self)
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation signal. On cancel, the in-flight file scan
/// completes and the scan returns a partial result with a warning.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = ScannerOptions::default();
        assert!(options.exclude_dirs.iter().any(|d| d == "node_modules"));
        assert!(options.include_extensions.iter().any(|e| e == "py"));
        assert_eq!(options.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(options.max_depth, -1);
        assert!(options.detect_test_files);
        assert!(options.category_ids.is_empty());
    }

    #[test]
    fn test_resolve_without_ignore_file() {
        let temp = TempDir::new().unwrap();
        let options = ScannerOptions::default().resolve(temp.path()).unwrap();
        assert_eq!(options, ScannerOptions::default());
    }

    #[test]
    fn test_resolve_appends_ignore_entries() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".pinataignore"),
            "# generated artifacts\n\ngenerated/\nfixtures\nnode_modules\n",
        )
        .unwrap();

        let options = ScannerOptions::default().resolve(temp.path()).unwrap();
        assert!(options.exclude_dirs.iter().any(|d| d == "generated"));
        assert!(options.exclude_dirs.iter().any(|d| d == "fixtures"));
        // Already-present entries are not duplicated.
        assert_eq!(
            options
                .exclude_dirs
                .iter()
                .filter(|d| *d == "node_modules")
                .count(),
            1
        );
    }

    #[test]
    fn test_resolve_rejects_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".pinataignore"), "src/generated\n").unwrap();

        let err = ScannerOptions::default().resolve(temp.path()).unwrap_err();
        assert_eq!(err.kind(), crate::types::ErrorKind::Config);
        assert!(err.to_string().contains("base name"));
    }

    #[test]
    fn test_options_toml_round_trip() {
        let options = ScannerOptions {
            min_severity: Some(Severity::High),
            max_depth: 3,
            ..Default::default()
        };
        let encoded = toml::to_string(&options).unwrap();
        let decoded: ScannerOptions = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, options);
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let result: std::result::Result<ScannerOptions, _> =
            toml::from_str("max_depht = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
    }
}
