//! Pattern Matcher
//!
//! Applies one category's patterns to one file's content and produces
//! located [`DetectionResult`]s. Two backends execute patterns: the
//! linear-time regex engine and the tree-sitter AST runtime. Semantic
//! patterns are declared in catalogs but never executed by the core;
//! an embedder may inject a [`SemanticMatcher`] to service them.
//!
//! Every pattern-level failure (invalid regex, invalid query, parse
//! failure) recovers locally: it is logged, recorded as a warning on the
//! outcome, and yields no matches. A single bad pattern cannot corrupt a
//! scan.

mod ast_backend;
mod grammar;
mod regex_backend;
mod snippet;

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::constants::matcher::DEFAULT_MAX_FILE_SIZE;
use crate::types::{
    Category, DetectionPattern, DetectionResult, Language, MatchContext, MatchDetail, PatternType,
    Result,
};

use ast_backend::AstEngine;
pub use grammar::{GrammarProvider, NativeGrammars};
use regex_backend::{RawMatch, RegexBackend};
use snippet::SourceText;

// =============================================================================
// Semantic Capability
// =============================================================================

/// One finding produced by an injected semantic matcher.
#[derive(Debug, Clone)]
pub struct SemanticFinding {
    /// 1-based
    pub line_start: u32,
    /// 1-based, >= line_start
    pub line_end: u32,
    /// 0-based byte column
    pub column_start: u32,
    /// 0-based byte column, exclusive
    pub column_end: u32,
    pub match_text: String,
}

/// Optional capability servicing `semantic` patterns. The core never
/// executes semantic patterns itself; without an injected matcher they
/// are skipped with a debug log.
pub trait SemanticMatcher: Send + Sync {
    /// Identifier recorded on results this matcher produces.
    fn name(&self) -> &str;

    fn find_matches(
        &self,
        pattern: &DetectionPattern,
        path: &Path,
        content: &str,
    ) -> Result<Vec<SemanticFinding>>;
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of scanning one file against one category.
#[derive(Debug, Default)]
pub struct FileScanOutcome {
    /// Language inferred from the extension; `None` when the file was
    /// not scanned (unknown extension or oversize)
    pub language: Option<Language>,
    pub results: Vec<DetectionResult>,
    pub warnings: Vec<String>,
}

// =============================================================================
// Pattern Matcher
// =============================================================================

/// Owns both backends and their caches for the lifetime of a scan.
pub struct PatternMatcher {
    max_file_size: u64,
    regex: RegexBackend,
    ast: AstEngine,
    semantic: Option<Box<dyn SemanticMatcher>>,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher {
    pub fn new() -> Self {
        Self::with_grammar_provider(Arc::new(NativeGrammars))
    }

    /// Build with an injected grammar set (tests, embedders).
    pub fn with_grammar_provider(grammars: Arc<dyn GrammarProvider>) -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            regex: RegexBackend::new(),
            ast: AstEngine::new(grammars),
            semantic: None,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_semantic(mut self, matcher: Box<dyn SemanticMatcher>) -> Self {
        self.semantic = Some(matcher);
        self
    }

    /// Number of parsed trees currently cached.
    pub fn cached_trees(&self) -> usize {
        self.ast.cached_trees()
    }

    pub fn clear_caches(&self) {
        self.ast.clear_cache();
    }

    /// Scan one file's content against one category's patterns.
    pub fn scan_file(&self, path: &Path, content: &str, category: &Category) -> FileScanOutcome {
        let mut outcome = FileScanOutcome::default();

        let Some(file_language) = Language::from_path(path) else {
            return outcome;
        };

        if content.len() as u64 > self.max_file_size {
            warn!(path = %path.display(), size = content.len(), "file exceeds size limit, skipping");
            outcome.warnings.push(format!(
                "skipped {}: {} bytes exceeds limit of {} bytes",
                path.display(),
                content.len(),
                self.max_file_size
            ));
            return outcome;
        }
        outcome.language = Some(file_language);

        let source = SourceText::new(content);
        let cache_key = content_identity(path, content);

        for pattern in &category.patterns {
            if !pattern.language.applies_to(file_language) {
                continue;
            }

            let raw_matches = match pattern.pattern_type {
                PatternType::Regex => {
                    self.regex
                        .find_matches(pattern, &source, &mut outcome.warnings)
                }
                PatternType::Ast => self.ast.find_matches(
                    pattern,
                    file_language,
                    &cache_key,
                    &source,
                    &mut outcome.warnings,
                ),
                PatternType::Semantic => {
                    self.semantic_matches(pattern, path, content, &mut outcome.warnings)
                }
            };

            for raw in raw_matches {
                outcome
                    .results
                    .push(build_result(category, pattern, path, &source, raw));
            }
        }

        self.apply_negative_patterns(category, &source, &mut outcome);
        outcome
    }

    fn semantic_matches(
        &self,
        pattern: &DetectionPattern,
        path: &Path,
        content: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<RawMatch> {
        let Some(matcher) = self.semantic.as_deref() else {
            debug!(pattern = %pattern.id, "no semantic matcher installed, skipping pattern");
            return Vec::new();
        };

        match matcher.find_matches(pattern, path, content) {
            Ok(findings) => findings
                .into_iter()
                .map(|finding| RawMatch {
                    line_start: finding.line_start.max(1),
                    line_end: finding.line_end.max(finding.line_start.max(1)),
                    column_start: finding.column_start,
                    column_end: finding.column_end,
                    match_text: finding.match_text,
                    capture: Some(matcher.name().to_string()),
                })
                .collect(),
            Err(err) => {
                warn!(pattern = %pattern.id, %err, "semantic matcher failed, skipping pattern");
                warnings.push(format!(
                    "semantic matcher failed for pattern '{}': {}",
                    pattern.id, err
                ));
                Vec::new()
            }
        }
    }

    /// Drop matches whose pattern declares a negative pattern that fires
    /// within the match's context window. An invalid negative pattern
    /// degrades open: the match is kept.
    fn apply_negative_patterns(
        &self,
        category: &Category,
        source: &SourceText<'_>,
        outcome: &mut FileScanOutcome,
    ) {
        if outcome.results.is_empty() {
            return;
        }

        let mut warned: std::collections::HashSet<String> = std::collections::HashSet::new();
        let FileScanOutcome {
            results, warnings, ..
        } = outcome;
        results.retain(|result| {
            let Ok(pattern) = category.pattern(&result.pattern_id) else {
                return true;
            };
            let Some(negative) = pattern.negative_pattern.as_deref() else {
                return true;
            };

            let negative_regex = match Regex::new(negative) {
                Ok(regex) => regex,
                Err(err) => {
                    if warned.insert(pattern.id.clone()) {
                        warn!(pattern = %pattern.id, %err,
                            "invalid negative pattern, keeping matches");
                        warnings.push(format!(
                            "invalid negative pattern in '{}', matches kept",
                            pattern.id
                        ));
                    }
                    return true;
                }
            };

            let window = source.negative_window(result.line_start, result.line_end);
            !negative_regex.is_match(&window)
        });
    }
}

/// Stable content identity for the parse cache: path plus content hash,
/// so an edited file re-parses while an unchanged one hits the cache.
fn content_identity(path: &Path, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}:{:x}", path.display(), hasher.finalize())
}

fn build_result(
    category: &Category,
    pattern: &DetectionPattern,
    path: &Path,
    source: &SourceText<'_>,
    raw: RawMatch,
) -> DetectionResult {
    let detail = match pattern.pattern_type {
        PatternType::Regex => MatchDetail::Regex,
        PatternType::Ast => MatchDetail::Ast {
            capture: raw.capture.clone().unwrap_or_default(),
        },
        PatternType::Semantic => MatchDetail::Semantic {
            source: raw.capture.clone().unwrap_or_else(|| "semantic".to_string()),
        },
    };

    DetectionResult {
        pattern_id: pattern.id.clone(),
        category_id: category.id.clone(),
        file_path: path.display().to_string(),
        line_start: raw.line_start,
        line_end: raw.line_end,
        code_snippet: source.snippet(raw.line_start, raw.line_end),
        confidence: pattern.confidence,
        context: MatchContext {
            match_text: raw.match_text,
            column_start: raw.column_start,
            column_end: raw.column_end,
            detail,
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
