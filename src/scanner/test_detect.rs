//! Test-File Detection
//!
//! Classifies files as test files so their matches can be suppressed
//! from gap construction. Detection is the union of user-supplied glob
//! patterns, built-in per-language patterns, and well-known test
//! directory components.

use std::path::Path;

use glob::Pattern;
use tracing::warn;

use crate::constants::scanner::{TEST_DIR_COMPONENTS, TEST_FILE_PATTERNS};

pub(crate) struct TestFileDetector {
    patterns: Vec<Pattern>,
}

impl TestFileDetector {
    /// Compile the built-in patterns plus any user-supplied ones. An
    /// invalid user glob is warned about and skipped.
    pub fn new(user_patterns: &[String]) -> (Self, Vec<String>) {
        let mut patterns = Vec::new();
        let mut warnings = Vec::new();

        for source in TEST_FILE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .chain(user_patterns.iter().cloned())
        {
            match Pattern::new(&source) {
                Ok(pattern) => patterns.push(pattern),
                Err(err) => {
                    warn!(pattern = %source, %err, "invalid test-file glob, skipping");
                    warnings.push(format!("invalid test-file pattern '{}'", source));
                }
            }
        }

        (Self { patterns }, warnings)
    }

    /// Whether `path` (under `root`) is a test file: its file name
    /// matches a glob, or any directory component relative to the root
    /// is a known test directory.
    pub fn is_test_file(&self, root: &Path, path: &Path) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && self.patterns.iter().any(|p| p.matches(name))
        {
            return true;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            // Only directory components count; the final component is
            // the file name.
            if components.peek().is_none() {
                break;
            }
            if let Some(name) = component.as_os_str().to_str()
                && TEST_DIR_COMPONENTS.contains(&name)
            {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> TestFileDetector {
        TestFileDetector::new(&[]).0
    }

    #[test]
    fn test_builtin_name_patterns() {
        let d = detector();
        let root = Path::new("/repo");
        assert!(d.is_test_file(root, Path::new("/repo/src/test_db.py")));
        assert!(d.is_test_file(root, Path::new("/repo/src/db_test.py")));
        assert!(d.is_test_file(root, Path::new("/repo/src/db.test.ts")));
        assert!(d.is_test_file(root, Path::new("/repo/src/db.spec.tsx")));
        assert!(d.is_test_file(root, Path::new("/repo/pkg/db_test.go")));
        assert!(d.is_test_file(root, Path::new("/repo/src/DbTest.java")));

        assert!(!d.is_test_file(root, Path::new("/repo/src/db.py")));
        assert!(!d.is_test_file(root, Path::new("/repo/src/testimony.py")));
    }

    #[test]
    fn test_directory_components() {
        let d = detector();
        let root = Path::new("/repo");
        assert!(d.is_test_file(root, Path::new("/repo/tests/db.py")));
        assert!(d.is_test_file(root, Path::new("/repo/src/test/db.py")));
        assert!(d.is_test_file(root, Path::new("/repo/web/__tests__/app.ts")));

        // Only whole components count.
        assert!(!d.is_test_file(root, Path::new("/repo/contests/db.py")));
        // A file merely named like a directory marker is not a test file.
        assert!(!d.is_test_file(root, Path::new("/repo/src/tests.py")));
    }

    #[test]
    fn test_user_patterns() {
        let (d, warnings) = TestFileDetector::new(&["it_*.py".to_string()]);
        assert!(warnings.is_empty());
        let root = Path::new("/repo");
        assert!(d.is_test_file(root, Path::new("/repo/src/it_login.py")));
        assert!(!d.is_test_file(root, Path::new("/repo/src/login.py")));
    }

    #[test]
    fn test_invalid_user_pattern_warned_and_skipped() {
        let (d, warnings) = TestFileDetector::new(&["[".to_string()]);
        assert_eq!(warnings.len(), 1);
        assert!(!d.is_test_file(Path::new("/repo"), Path::new("/repo/src/db.py")));
    }
}
