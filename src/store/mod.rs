//! Category Store
//!
//! Validated in-memory catalog of detection categories with multi-axis
//! indices and ranked full-text search.
//!
//! The store is read-mostly: lookups, listings, and searches take
//! `&self`; `add`/`remove`/`clear` take `&mut self`. That expresses the
//! shared-resource policy directly in the borrow system - a scanner holds
//! a shared borrow for the duration of a scan and no mutation can race it.

mod index;
mod loader;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::store::{EXACT_HIT_SCORE, PREFIX_HIT_SCORE, SEARCH_DEFAULT_LIMIT};
use crate::types::{
    Category, CategoryFilter, CategorySummary, Domain, Language, PinataError, Priority, Result,
    Severity, TestLevel, ValidationIssue,
};

use index::CategoryIndex;
pub use index::tokenize;
pub(crate) use loader::yaml_files;

// =============================================================================
// Search Types
// =============================================================================

/// Options for [`CategoryStore::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub filter: Option<CategoryFilter>,
    /// Result cap; `None` uses the default limit
    pub limit: Option<usize>,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub category: CategorySummary,
    pub score: u32,
    /// Index tokens that produced the score, in first-hit order
    pub matches: Vec<String>,
}

/// Aggregate store statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_categories: usize,
    pub total_patterns: usize,
    pub by_domain: std::collections::BTreeMap<Domain, usize>,
    pub by_priority: std::collections::BTreeMap<Priority, usize>,
    pub by_severity: std::collections::BTreeMap<Severity, usize>,
}

// =============================================================================
// Category Store
// =============================================================================

/// In-memory catalog of categories. Owns the documents and every index.
#[derive(Debug, Default)]
pub struct CategoryStore {
    categories: HashMap<String, Category>,
    index: CategoryIndex,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a category. Replacing an existing id requires
    /// a strictly greater version; on accept, prior indices for the id
    /// are removed and rebuilt atomically with the insert.
    pub fn add(&mut self, category: Category) -> Result<()> {
        category.validate()?;

        if let Some(existing) = self.categories.get(&category.id)
            && category.version <= existing.version
        {
            return Err(PinataError::validation(
                &category.id,
                vec![
                    ValidationIssue::new(
                        "version",
                        "must be strictly greater than the stored version",
                    )
                    .with_comparison(
                        format!("> {}", existing.version),
                        category.version.to_string(),
                    ),
                ],
            ));
        }

        if let Some(previous) = self.categories.remove(&category.id) {
            self.index.remove(&previous);
            debug!(id = %category.id, from = previous.version, to = category.version,
                "replacing category");
        }
        self.index.insert(&category);
        self.categories.insert(category.id.clone(), category);
        Ok(())
    }

    /// O(1) lookup; fails with NotFound.
    pub fn get(&self, id: &str) -> Result<&Category> {
        self.categories
            .get(id)
            .ok_or_else(|| PinataError::not_found("category", id))
    }

    pub fn has(&self, id: &str) -> bool {
        self.categories.contains_key(id)
    }

    /// Remove and return a category; fails with NotFound.
    pub fn remove(&mut self, id: &str) -> Result<Category> {
        let category = self
            .categories
            .remove(id)
            .ok_or_else(|| PinataError::not_found("category", id))?;
        self.index.remove(&category);
        Ok(category)
    }

    /// Summaries ordered by (priority asc, severity asc, name asc). An
    /// absent filter lists everything; filter axes intersect.
    pub fn list(&self, filter: Option<&CategoryFilter>) -> Vec<CategorySummary> {
        let mut summaries: Vec<CategorySummary> = match filter {
            Some(f) if !f.is_empty() => match self.index.filtered_ids(f) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| self.categories.get(id))
                    .map(Category::summary)
                    .collect(),
                None => self.categories.values().map(Category::summary).collect(),
            },
            _ => self.categories.values().map(Category::summary).collect(),
        };

        summaries.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.severity.cmp(&b.severity))
                .then_with(|| a.name.cmp(&b.name))
        });
        summaries
    }

    pub fn by_domain(&self, domain: Domain) -> Vec<CategorySummary> {
        self.list(Some(&CategoryFilter {
            domain: Some(domain),
            ..Default::default()
        }))
    }

    pub fn by_level(&self, level: TestLevel) -> Vec<CategorySummary> {
        self.list(Some(&CategoryFilter {
            level: Some(level),
            ..Default::default()
        }))
    }

    pub fn by_language(&self, language: Language) -> Vec<CategorySummary> {
        self.list(Some(&CategoryFilter {
            language: Some(language),
            ..Default::default()
        }))
    }

    /// Ranked full-text search. Per query token: +10 for an exact index
    /// hit, +5 for every index token the query token strictly prefixes.
    /// The filter applies post-hoc; ordering is (score desc, priority
    /// asc, id asc).
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let limit = options.limit.unwrap_or(SEARCH_DEFAULT_LIMIT);
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<String, u32> = HashMap::new();
        let mut matched: HashMap<String, Vec<String>> = HashMap::new();

        fn record(
            scores: &mut HashMap<String, u32>,
            matched: &mut HashMap<String, Vec<String>>,
            id: &str,
            points: u32,
            token: &str,
        ) {
            *scores.entry(id.to_string()).or_default() += points;
            let tokens = matched.entry(id.to_string()).or_default();
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }

        for token in &tokens {
            if let Some(ids) = self.index.exact_hits(token) {
                for id in ids {
                    record(&mut scores, &mut matched, id, EXACT_HIT_SCORE, token);
                }
            }
            for (indexed, ids) in self.index.prefix_hits(token) {
                for id in ids {
                    record(&mut scores, &mut matched, id, PREFIX_HIT_SCORE, indexed);
                }
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .filter_map(|(id, score)| {
                let category = self.categories.get(&id)?;
                if let Some(filter) = &options.filter
                    && !filter.matches(category)
                {
                    return None;
                }
                Some(SearchHit {
                    category: category.summary(),
                    score,
                    matches: matched.remove(&id).unwrap_or_default(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.category.priority.cmp(&b.category.priority))
                .then_with(|| a.category.id.cmp(&b.category.id))
        });
        hits.truncate(limit);
        hits
    }

    /// Aggregate counts across the catalog.
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            total_categories: self.categories.len(),
            ..Default::default()
        };
        for category in self.categories.values() {
            stats.total_patterns += category.patterns.len();
            *stats.by_domain.entry(category.domain).or_default() += 1;
            *stats.by_priority.entry(category.priority).or_default() += 1;
            *stats.by_severity.entry(category.severity).or_default() += 1;
        }
        stats
    }

    /// All categories, ordered by id for determinism.
    pub fn to_array(&self) -> Vec<&Category> {
        let mut all: Vec<&Category> = self.categories.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn clear(&mut self) {
        self.categories.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::category::tests::category;

    fn store_with(ids: &[&str]) -> CategoryStore {
        let mut store = CategoryStore::new();
        for id in ids {
            store.add(category(id)).unwrap();
        }
        store
    }

    #[test]
    fn test_add_and_get() {
        let store = store_with(&["sql-injection"]);
        assert!(store.has("sql-injection"));
        assert_eq!(store.get("sql-injection").unwrap().version, 1);
        assert!(store.get("nope").is_err());
    }

    #[test]
    fn test_add_rejects_invalid() {
        let mut store = CategoryStore::new();
        let mut bad = category("sql-injection");
        bad.patterns.clear();
        assert!(store.add(bad).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_version_must_increase() {
        let mut store = store_with(&["sql-injection"]);

        // Same version: rejected.
        assert!(store.add(category("sql-injection")).is_err());

        // Greater version: accepted, replaces.
        let mut v2 = category("sql-injection");
        v2.version = 2;
        v2.name = "SQL Injection v2".to_string();
        store.add(v2).unwrap();
        assert_eq!(store.get("sql-injection").unwrap().version, 2);
        assert_eq!(store.len(), 1);

        // Lower version after replace: rejected.
        assert!(store.add(category("sql-injection")).is_err());
    }

    #[test]
    fn test_replace_reindexes() {
        let mut store = store_with(&["sql-injection"]);
        let mut v2 = category("sql-injection");
        v2.version = 2;
        v2.domain = Domain::Data;
        store.add(v2).unwrap();

        assert!(store.by_domain(Domain::Security).is_empty());
        assert_eq!(store.by_domain(Domain::Data).len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = store_with(&["sql-injection"]);
        let removed = store.remove("sql-injection").unwrap();
        assert_eq!(removed.id, "sql-injection");
        assert!(store.is_empty());
        assert!(store.remove("sql-injection").is_err());
        assert!(store.by_domain(Domain::Security).is_empty());
    }

    #[test]
    fn test_list_ordering() {
        let mut store = CategoryStore::new();

        let mut low = category("low-risk");
        low.priority = Priority::P2;
        low.severity = Severity::Low;
        low.name = "Zebra".to_string();
        store.add(low).unwrap();

        let mut mid = category("command-injection");
        mid.priority = Priority::P0;
        mid.severity = Severity::High;
        mid.name = "Command Injection".to_string();
        store.add(mid).unwrap();

        let critical = category("sql-injection"); // P0 / critical
        store.add(critical).unwrap();

        let listed = store.list(None);
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sql-injection", "command-injection", "low-risk"]);
    }

    #[test]
    fn test_list_filter_intersection() {
        let mut store = store_with(&["sql-injection"]);
        let mut other = category("race-condition");
        other.domain = Domain::Concurrency;
        store.add(other).unwrap();

        let filter = CategoryFilter {
            domain: Some(Domain::Security),
            priority: Some(Priority::P0),
            ..Default::default()
        };
        let listed = store.list(Some(&filter));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "sql-injection");
    }

    #[test]
    fn test_search_exact_beats_prefix() {
        let mut store = store_with(&["sql-injection"]);
        let mut tool = category("sqlmap-scan");
        tool.name = "Sqlmap Residue".to_string();
        tool.description = "leftover scanner markers".to_string();
        store.add(tool).unwrap();

        let hits = store.search("sql", &SearchOptions::default());
        assert_eq!(hits.len(), 2);
        // Exact token "sql" (10) on sql-injection; "sqlmap" is only a
        // prefix hit (5) for the other.
        assert_eq!(hits[0].category.id, "sql-injection");
        assert_eq!(hits[0].score, 10);
        assert_eq!(hits[1].category.id, "sqlmap-scan");
        assert_eq!(hits[1].score, 5);
        assert_eq!(hits[1].matches, vec!["sqlmap"]);
    }

    #[test]
    fn test_search_prefix_accumulates_per_token() {
        let store = store_with(&["sql-injection"]);
        // "inject" prefixes "injection"; "sq" prefixes "sql".
        let hits = store.search("inject sq", &SearchOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 10);
        assert_eq!(hits[0].matches.len(), 2);
    }

    #[test]
    fn test_search_filter_and_limit() {
        let mut store = store_with(&["sql-injection"]);
        let mut other = category("nosql-injection");
        other.domain = Domain::Data;
        store.add(other).unwrap();

        let options = SearchOptions {
            filter: Some(CategoryFilter {
                domain: Some(Domain::Data),
                ..Default::default()
            }),
            limit: None,
        };
        let hits = store.search("injection", &options);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category.id, "nosql-injection");

        let capped = store.search(
            "injection",
            &SearchOptions {
                filter: None,
                limit: Some(1),
            },
        );
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_search_short_tokens_dropped() {
        let store = store_with(&["sql-injection"]);
        assert!(store.search("a ! b", &SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_axis_wrappers() {
        let store = store_with(&["sql-injection"]);
        assert_eq!(store.by_level(TestLevel::Unit).len(), 1);
        assert!(store.by_level(TestLevel::Chaos).is_empty());
        assert_eq!(store.by_language(Language::Python).len(), 1);
        assert!(store.by_language(Language::Go).is_empty());
    }

    #[test]
    fn test_stats() {
        let mut store = store_with(&["sql-injection"]);
        let mut other = category("race-condition");
        other.domain = Domain::Concurrency;
        other.severity = Severity::High;
        store.add(other).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.total_patterns, 2);
        assert_eq!(stats.by_domain[&Domain::Security], 1);
        assert_eq!(stats.by_domain[&Domain::Concurrency], 1);
        assert_eq!(stats.by_severity[&Severity::Critical], 1);
    }

    #[test]
    fn test_to_array_and_clear() {
        let mut store = store_with(&["zz-last", "aa-first"]);
        let ids: Vec<&str> = store.to_array().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["aa-first", "zz-last"]);

        store.clear();
        assert!(store.is_empty());
        assert!(store.list(None).is_empty());
    }
}
