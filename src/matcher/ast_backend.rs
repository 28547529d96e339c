//! AST Backend
//!
//! Tree-sitter parsing and query execution. Parsed trees are cached by a
//! caller-supplied stable identity (path + content hash) in a concurrent
//! map so parallel file workers share one cache. Only *primary* captures
//! surface as matches; helper captures merely constrain the query.
//!
//! Positions from the parser are 0-based rows internally and surface as
//! 1-based lines. For a capture spanning multiple lines, `column_start`
//! is the node's start column and `column_end` its end column on the
//! last line.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};
use tree_sitter::{Query, QueryCursor, StreamingIterator};

use crate::types::{DetectionPattern, Language};

use super::grammar::GrammarProvider;
use super::regex_backend::RawMatch;
use super::snippet::SourceText;

/// Capture-name markers that make a capture primary.
const PRIMARY_CAPTURE_MARKERS: &[&str] = &[
    "call",
    "match",
    "target",
    "vulnerable",
    "detection",
    "assertion",
];

fn is_primary_capture(name: &str) -> bool {
    PRIMARY_CAPTURE_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}

/// Tree-sitter runtime with a shared parse cache.
pub(crate) struct AstEngine {
    grammars: Arc<dyn GrammarProvider>,
    /// stable content identity -> parsed tree
    trees: DashMap<String, Arc<tree_sitter::Tree>>,
}

impl AstEngine {
    pub fn new(grammars: Arc<dyn GrammarProvider>) -> Self {
        Self {
            grammars,
            trees: DashMap::new(),
        }
    }

    pub fn cached_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn clear_cache(&self) {
        self.trees.clear();
    }

    /// Parse `content`, reusing the cached tree when the identity is
    /// already present.
    fn parse_cached(
        &self,
        cache_key: &str,
        language: Language,
        content: &str,
    ) -> Option<Arc<tree_sitter::Tree>> {
        if let Some(tree) = self.trees.get(cache_key) {
            return Some(tree.value().clone());
        }

        let grammar = self.grammars.grammar(language)?;
        let mut parser = tree_sitter::Parser::new();
        if let Err(err) = parser.set_language(&grammar) {
            warn!(%language, %err, "failed to load grammar");
            return None;
        }

        let tree = Arc::new(parser.parse(content, None)?);
        self.trees.insert(cache_key.to_string(), tree.clone());
        Some(tree)
    }

    /// Run one AST query pattern against a file. Unsupported languages
    /// and invalid queries yield no matches; only query failures produce
    /// a caller-visible warning.
    pub fn find_matches(
        &self,
        pattern: &DetectionPattern,
        file_language: Language,
        cache_key: &str,
        source: &SourceText<'_>,
        warnings: &mut Vec<String>,
    ) -> Vec<RawMatch> {
        if !file_language.has_ast_support() {
            debug!(%file_language, pattern = %pattern.id, "no AST grammar, skipping pattern");
            return Vec::new();
        }

        let Some(grammar) = self.grammars.grammar(file_language) else {
            debug!(%file_language, pattern = %pattern.id, "grammar provider has no grammar");
            return Vec::new();
        };

        let query = match Query::new(&grammar, &pattern.pattern) {
            Ok(query) => query,
            Err(err) => {
                warn!(pattern = %pattern.id, %err, "invalid tree-sitter query, skipping");
                warnings.push(format!("invalid AST query in pattern '{}'", pattern.id));
                return Vec::new();
            }
        };

        let Some(tree) = self.parse_cached(cache_key, file_language, source.text()) else {
            warnings.push(format!(
                "failed to parse file for AST pattern '{}'",
                pattern.id
            ));
            return Vec::new();
        };

        let capture_names = query.capture_names();
        let mut seen: HashSet<(u32, u32, u32, u32)> = HashSet::new();
        let mut results = Vec::new();

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), source.text().as_bytes());
        while let Some(found) = matches.next() {
            for capture in found.captures.iter() {
                let name = capture_names[capture.index as usize];
                if !is_primary_capture(name) {
                    continue;
                }

                let start = capture.node.start_position();
                let end = capture.node.end_position();
                let key = (
                    start.row as u32,
                    start.column as u32,
                    end.row as u32,
                    end.column as u32,
                );
                if !seen.insert(key) {
                    continue;
                }

                let text = capture
                    .node
                    .utf8_text(source.text().as_bytes())
                    .unwrap_or_default()
                    .to_string();
                results.push(RawMatch {
                    line_start: start.row as u32 + 1,
                    line_end: end.row as u32 + 1,
                    column_start: start.column as u32,
                    column_end: end.column as u32,
                    match_text: text,
                    capture: Some(name.to_string()),
                });
            }
        }

        results
    }
}
