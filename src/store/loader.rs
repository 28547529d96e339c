//! Catalog Loading
//!
//! Recursive YAML loading for the on-disk catalog: a directory tree of
//! `*.yml`/`*.yaml` files, one category document per file. The file name
//! is advisory; the document's `id` is authoritative.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info};

use crate::types::{PinataError, Result, ResultExt};

use super::CategoryStore;

/// Enumerate every YAML file under `root`, sorted for deterministic load
/// order. Symlinks are not followed.
pub(crate) fn yaml_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PinataError::analysis_in(
            root,
            "catalog path is not a directory",
        ));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yml") | Some("yaml")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

impl CategoryStore {
    /// Recursively read every `*.yml`/`*.yaml` under `path`, parse,
    /// validate, and add. Returns the count of categories added. A parse
    /// or validation failure aborts the load and names the offending
    /// file.
    pub fn load_from_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let root = path.as_ref();
        let files = yaml_files(root)?;
        let mut added = 0usize;

        for file in &files {
            let display_path = file.display().to_string();
            let content = std::fs::read_to_string(file).analysis_context(file.clone())?;
            let category: crate::types::Category =
                serde_yaml::from_str(&content).parse_context(&display_path)?;

            debug!(file = %display_path, id = %category.id, "loading category");
            self.add(category).map_err(|err| match err {
                PinataError::Validation { subject, issues } => {
                    PinataError::validation(format!("{} ({})", subject, display_path), issues)
                }
                other => other,
            })?;
            added += 1;
        }

        info!(count = added, root = %root.display(), "catalog loaded");
        Ok(added)
    }
}
