//! Regex Backend
//!
//! Line-aware regex matching over one file. Patterns compile once with
//! multi-line semantics and are cached by source; the engine is the
//! linear-time `regex` crate, so pathological backtracking classes
//! cannot occur at match time. An invalid pattern never aborts a scan:
//! it is warned about and yields no matches.

use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::types::DetectionPattern;

use super::snippet::SourceText;

/// One located raw hit, before enrichment into a detection result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawMatch {
    /// 1-based
    pub line_start: u32,
    /// 1-based, >= line_start
    pub line_end: u32,
    /// 0-based byte column on the first line
    pub column_start: u32,
    /// 0-based byte column just past the match on the last line
    pub column_end: u32,
    pub match_text: String,
    /// Primary capture name for AST hits; `None` for regex hits
    pub capture: Option<String>,
}

pub(crate) struct RegexBackend {
    /// pattern source -> compiled regex, or None when compilation failed
    cache: DashMap<String, Option<Regex>>,
}

impl RegexBackend {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Compile with multi-line semantics, caching the outcome. A failed
    /// compile is cached too so the warning fires once per pattern.
    fn compile(&self, source: &str, pattern_id: &str) -> Option<Regex> {
        if let Some(cached) = self.cache.get(source) {
            return cached.value().clone();
        }
        let compiled = match RegexBuilder::new(source).multi_line(true).build() {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern = pattern_id, %err, "invalid regex pattern, skipping");
                None
            }
        };
        self.cache.insert(source.to_string(), compiled.clone());
        compiled
    }

    /// All matches of a pattern in `source`. Zero-width matches advance
    /// the cursor by one character so the scan always terminates, and a
    /// zero-width match is emitted at most once per offset.
    pub fn find_matches(
        &self,
        pattern: &DetectionPattern,
        source: &SourceText<'_>,
        warnings: &mut Vec<String>,
    ) -> Vec<RawMatch> {
        let Some(regex) = self.compile(&pattern.pattern, &pattern.id) else {
            warnings.push(format!("invalid regex in pattern '{}'", pattern.id));
            return Vec::new();
        };

        let text = source.text();
        let mut matches = Vec::new();
        let mut at = 0usize;
        let mut last_empty: Option<usize> = None;

        while at <= text.len() {
            let Some(found) = regex.find_at(text, at) else {
                break;
            };

            if found.is_empty() {
                if last_empty != Some(found.start()) {
                    matches.push(Self::raw(source, found.start(), found.end()));
                    last_empty = Some(found.start());
                }
                // Step over one character to guarantee progress.
                at = next_char_boundary(text, found.end());
            } else {
                matches.push(Self::raw(source, found.start(), found.end()));
                at = found.end();
            }
        }

        matches
    }

    fn raw(source: &SourceText<'_>, start: usize, end: usize) -> RawMatch {
        let (line_start0, column_start) = source.position(start);
        let end_inclusive = if end > start { end - 1 } else { start };
        let (line_end0, _) = source.position(end_inclusive);
        // Exclusive end column, measured on the match's last line even
        // when the match ends in a newline.
        let column_end = (end - source.line_start_offset(line_end0 as usize)) as u32;

        RawMatch {
            line_start: line_start0 + 1,
            line_end: line_end0 + 1,
            column_start,
            column_end,
            match_text: source.text()[start..end].to_string(),
            capture: None,
        }
    }
}

/// Offset of the next character boundary strictly after `at` (or one
/// past the end of the text).
fn next_char_boundary(text: &str, at: usize) -> usize {
    if at >= text.len() {
        return text.len() + 1;
    }
    let mut next = at + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}
