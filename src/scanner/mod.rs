//! Scanner
//!
//! Orchestrates a full repository scan: resolves options, walks the
//! target tree, runs the pattern matcher per (file, category), converts
//! matches to ranked gaps, computes coverage and the aggregate score,
//! and assembles the [`ScanResult`].
//!
//! The scanner only reads the category store; it borrows the store for
//! the duration of the scan. File-level failures (unreadable file,
//! matcher trouble) are recovered as warnings and never abort the run.

pub(crate) mod coverage;
mod options;
pub(crate) mod scoring;
mod test_detect;
mod walker;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::constants::scoring::SUMMARY_TOP_GAPS;
use crate::matcher::PatternMatcher;
use crate::store::CategoryStore;
use crate::types::{
    Category, FileStats, Gap, Language, PinataError, Result, ScanResult, ScanSummary,
};

pub use options::{CancelFlag, ScannerOptions};

/// Repository scanner. Borrows a store; owns its matcher, walker state,
/// and result buffers.
pub struct Scanner<'store> {
    store: &'store CategoryStore,
    options: ScannerOptions,
    matcher: PatternMatcher,
    cancel: CancelFlag,
}

impl<'store> Scanner<'store> {
    pub fn new(store: &'store CategoryStore, options: ScannerOptions) -> Self {
        let matcher = PatternMatcher::new().with_max_file_size(options.max_file_size);
        Self {
            store,
            options,
            matcher,
            cancel: CancelFlag::new(),
        }
    }

    /// Substitute a preconfigured matcher (custom grammars, semantic
    /// capability). The size limit from the options still applies.
    pub fn with_matcher(mut self, matcher: PatternMatcher) -> Self {
        self.matcher = matcher.with_max_file_size(self.options.max_file_size);
        self
    }

    /// Handle for cancelling this scan from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run a full scan of `target`.
    pub fn scan<P: AsRef<Path>>(&self, target: P) -> Result<ScanResult> {
        let target = target.as_ref();
        let started_at = Utc::now();
        let clock = Instant::now();

        // Validate the target before anything else.
        if !target.exists() {
            return Err(PinataError::analysis_in(target, "target does not exist"));
        }
        if !target.is_dir() {
            return Err(PinataError::analysis_in(target, "target is not a directory"));
        }

        let options = self.options.clone().resolve(target)?;
        let selected = self.select_categories(&options);
        info!(
            target = %target.display(),
            categories = selected.len(),
            "starting scan"
        );

        let (files, mut warnings) = walker::walk(target, &options);
        let (detector, detector_warnings) =
            test_detect::TestFileDetector::new(&options.test_file_patterns);
        warnings.extend(detector_warnings);

        let mut file_stats = FileStats {
            total_files: files.len() as u32,
            ..Default::default()
        };
        let mut raw_results = Vec::new();
        let mut test_paths: HashSet<String> = HashSet::new();
        let mut cancelled = false;

        for file in &files {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            if let Some(language) = Language::from_path(&file.path) {
                *file_stats.by_language.entry(language).or_default() += 1;
            }

            let is_test = detector.is_test_file(target, &file.path);
            if is_test {
                file_stats.test_files += 1;
                test_paths.insert(file.path.display().to_string());
            } else {
                file_stats.source_files += 1;
            }

            // Oversize files are skipped before reading; the stat came
            // from the walk.
            if file.size > options.max_file_size {
                warn!(path = %file.path.display(), size = file.size, "file exceeds size limit, skipping");
                warnings.push(format!(
                    "skipped {}: {} bytes exceeds limit of {} bytes",
                    file.path.display(),
                    file.size,
                    options.max_file_size
                ));
                continue;
            }

            let content = match std::fs::read_to_string(&file.path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(path = %file.path.display(), %err, "cannot read file, skipping");
                    warnings.push(format!("cannot read {}: {}", file.path.display(), err));
                    continue;
                }
            };

            for category in &selected {
                let outcome = self.matcher.scan_file(&file.path, &content, category);
                warnings.extend(outcome.warnings);
                raw_results.extend(outcome.results);
            }
        }

        if cancelled {
            warnings.push("scan cancelled; results are partial".to_string());
        }

        // Gap construction: test files are suppressed, categories must
        // still exist, thresholds drop anything below them.
        let mut gaps = Vec::new();
        for result in raw_results {
            if options.detect_test_files && test_paths.contains(&result.file_path) {
                debug!(path = %result.file_path, "dropping match in test file");
                continue;
            }
            let Ok(category) = self.store.get(&result.category_id) else {
                continue;
            };
            if let Some(min) = options.min_severity
                && !category.severity.at_least(min)
            {
                continue;
            }
            if let Some(min) = options.min_confidence
                && !result.confidence.at_least(min)
            {
                continue;
            }

            let priority_score = Gap::priority_score_for(
                category.severity,
                result.confidence,
                category.priority,
            );
            gaps.push(Gap {
                domain: category.domain,
                level: category.level,
                priority: category.priority,
                severity: category.severity,
                pattern_type: category
                    .pattern(&result.pattern_id)
                    .map(|p| p.pattern_type)
                    .unwrap_or(crate::types::PatternType::Regex),
                priority_score,
                detection: result,
            });
        }
        gaps.sort_by(Gap::ranking_cmp);

        let with_gaps: HashSet<&str> = gaps
            .iter()
            .map(|gap| gap.detection.file_path.as_str())
            .collect();
        file_stats.files_with_gaps = with_gaps.len() as u32;

        let coverage = coverage::compute_coverage(&selected, &gaps);
        let score = scoring::compute_score(&selected, &gaps, &coverage);

        let mut gaps_by_category: BTreeMap<String, Vec<Gap>> = BTreeMap::new();
        let mut gaps_by_file: BTreeMap<String, Vec<Gap>> = BTreeMap::new();
        for gap in &gaps {
            gaps_by_category
                .entry(gap.detection.category_id.clone())
                .or_default()
                .push(gap.clone());
            gaps_by_file
                .entry(gap.detection.file_path.clone())
                .or_default()
                .push(gap.clone());
        }

        let summary = ScanSummary {
            total_gaps: gaps.len() as u32,
            categories_evaluated: selected.len() as u32,
            top_gaps: gaps.iter().take(SUMMARY_TOP_GAPS).cloned().collect(),
        };

        let finished_at = Utc::now();
        info!(
            gaps = gaps.len(),
            score = score.overall,
            grade = %score.grade,
            "scan finished"
        );

        Ok(ScanResult {
            target_directory: target.display().to_string(),
            started_at,
            finished_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            gaps,
            gaps_by_category,
            gaps_by_file,
            coverage,
            file_stats,
            score,
            warnings,
            summary,
        })
    }

    /// Categories enabled for this scan, in id order: whitelist filters
    /// intersect (empty = all).
    fn select_categories(&self, options: &ScannerOptions) -> Vec<&'store Category> {
        self.store
            .to_array()
            .into_iter()
            .filter(|category| {
                (options.category_ids.is_empty()
                    || options.category_ids.iter().any(|id| *id == category.id))
                    && (options.domains.is_empty() || options.domains.contains(&category.domain))
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
