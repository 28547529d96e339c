//! Directory Walker
//!
//! Depth-first enumeration of the scan target. Directories are skipped
//! by base name (exclusions plus dot-directories), depth is capped, and
//! symlinks are never followed so cycles cannot loop. Output is sorted
//! by path so downstream processing is deterministic.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use super::options::ScannerOptions;

/// One file selected for scanning.
#[derive(Debug, Clone)]
pub(crate) struct WalkedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Files under `root` whose extension is included, honoring directory
/// exclusions and `max_depth`. Per-entry walker failures become
/// warnings; the walk itself continues.
pub(crate) fn walk(root: &Path, options: &ScannerOptions) -> (Vec<WalkedFile>, Vec<String>) {
    let exclude: Vec<String> = options.exclude_dirs.clone();

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            // The root itself always passes; everything else is screened
            // by base name.
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                return true;
            }
            let Some(name) = entry.file_name().to_str() else {
                return false;
            };
            if name.starts_with('.') {
                debug!(dir = name, "skipping dot-directory");
                return false;
            }
            if exclude.iter().any(|d| d == name) {
                debug!(dir = name, "skipping excluded directory");
                return false;
            }
            true
        });

    if options.max_depth >= 0 {
        builder.max_depth(Some(options.max_depth as usize));
    }

    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("walk error: {}", err));
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !options
            .include_extensions
            .iter()
            .any(|included| included == extension)
        {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        files.push(WalkedFile {
            path: path.to_path_buf(),
            size,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    (files, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "content").unwrap();
    }

    #[test]
    fn test_walk_collects_included_extensions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/app.py");
        touch(temp.path(), "src/notes.txt");
        touch(temp.path(), "web/app.ts");

        let (files, warnings) = walk(temp.path(), &ScannerOptions::default());
        assert!(warnings.is_empty());
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["app.py", "app.ts"]);
    }

    #[test]
    fn test_walk_skips_excluded_dirs_at_any_depth() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/app.py");
        touch(temp.path(), "src/node_modules/dep/index.js");
        touch(temp.path(), "node_modules/other/index.js");

        let (files, _) = walk(temp.path(), &ScannerOptions::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("src/app.py"));
    }

    #[test]
    fn test_walk_skips_dot_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "app.py");
        touch(temp.path(), ".hidden/secret.py");

        let (files, _) = walk(temp.path(), &ScannerOptions::default());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walk_honors_max_depth() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "top.py");
        touch(temp.path(), "a/mid.py");
        touch(temp.path(), "a/b/deep.py");

        let options = ScannerOptions {
            max_depth: 2,
            ..Default::default()
        };
        let (files, _) = walk(temp.path(), &options);
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["mid.py", "top.py"]);
    }

    #[test]
    fn test_walk_unlimited_depth() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a/b/c/d/e/deep.py");

        let (files, _) = walk(temp.path(), &ScannerOptions::default());
        assert_eq!(files.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_does_not_follow_symlink_cycles() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/app.py");
        std::os::unix::fs::symlink(temp.path(), temp.path().join("src/loop")).unwrap();

        let (files, _) = walk(temp.path(), &ScannerOptions::default());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walk_output_sorted() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "z.py");
        touch(temp.path(), "a.py");
        touch(temp.path(), "m/x.py");

        let (files, _) = walk(temp.path(), &ScannerOptions::default());
        let paths: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }
}
