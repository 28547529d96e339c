//! Category Indices
//!
//! Multi-axis index sets and the full-text search index maintained by the
//! store. Index sets are `BTreeSet`s so intersections and listings come
//! out in a stable order regardless of insertion order.

use std::collections::{BTreeSet, HashMap};

use crate::constants::store::MIN_TOKEN_LEN;
use crate::types::{Category, CategoryFilter, Domain, Language, Priority, Severity, TestLevel};

/// Split on non-alphanumeric boundaries, lowercase, drop short tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| t.to_lowercase())
        .collect()
}

/// All index sets for one store. Owned and kept consistent by the store;
/// every mutation goes through `insert`/`remove`.
#[derive(Debug, Default)]
pub struct CategoryIndex {
    by_domain: HashMap<Domain, BTreeSet<String>>,
    by_level: HashMap<TestLevel, BTreeSet<String>>,
    by_language: HashMap<Language, BTreeSet<String>>,
    by_priority: HashMap<Priority, BTreeSet<String>>,
    by_severity: HashMap<Severity, BTreeSet<String>>,
    /// token -> ids of categories whose indexed text contains the token
    search: HashMap<String, BTreeSet<String>>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens indexed for a category: id, name, description, domain,
    /// level, languages, and CVE ids.
    fn index_tokens(category: &Category) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        tokens.extend(tokenize(&category.id));
        tokens.extend(tokenize(&category.name));
        tokens.extend(tokenize(&category.description));
        tokens.extend(tokenize(category.domain.as_str()));
        tokens.extend(tokenize(category.level.as_str()));
        for language in &category.applicable_languages {
            tokens.extend(tokenize(language.as_str()));
        }
        for cve in &category.cves {
            tokens.extend(tokenize(cve));
        }
        tokens
    }

    pub fn insert(&mut self, category: &Category) {
        let id = category.id.clone();
        self.by_domain
            .entry(category.domain)
            .or_default()
            .insert(id.clone());
        self.by_level
            .entry(category.level)
            .or_default()
            .insert(id.clone());
        for language in &category.applicable_languages {
            self.by_language
                .entry(*language)
                .or_default()
                .insert(id.clone());
        }
        self.by_priority
            .entry(category.priority)
            .or_default()
            .insert(id.clone());
        self.by_severity
            .entry(category.severity)
            .or_default()
            .insert(id.clone());
        for token in Self::index_tokens(category) {
            self.search.entry(token).or_default().insert(id.clone());
        }
    }

    pub fn remove(&mut self, category: &Category) {
        let id = &category.id;
        if let Some(set) = self.by_domain.get_mut(&category.domain) {
            set.remove(id);
        }
        if let Some(set) = self.by_level.get_mut(&category.level) {
            set.remove(id);
        }
        for language in &category.applicable_languages {
            if let Some(set) = self.by_language.get_mut(language) {
                set.remove(id);
            }
        }
        if let Some(set) = self.by_priority.get_mut(&category.priority) {
            set.remove(id);
        }
        if let Some(set) = self.by_severity.get_mut(&category.severity) {
            set.remove(id);
        }
        for token in Self::index_tokens(category) {
            if let Some(set) = self.search.get_mut(&token) {
                set.remove(id);
                if set.is_empty() {
                    self.search.remove(&token);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.by_domain.clear();
        self.by_level.clear();
        self.by_language.clear();
        self.by_priority.clear();
        self.by_severity.clear();
        self.search.clear();
    }

    pub fn ids_for_domain(&self, domain: Domain) -> Option<&BTreeSet<String>> {
        self.by_domain.get(&domain)
    }

    pub fn ids_for_level(&self, level: TestLevel) -> Option<&BTreeSet<String>> {
        self.by_level.get(&level)
    }

    pub fn ids_for_language(&self, language: Language) -> Option<&BTreeSet<String>> {
        self.by_language.get(&language)
    }

    pub fn ids_for_priority(&self, priority: Priority) -> Option<&BTreeSet<String>> {
        self.by_priority.get(&priority)
    }

    pub fn ids_for_severity(&self, severity: Severity) -> Option<&BTreeSet<String>> {
        self.by_severity.get(&severity)
    }

    /// Intersection of the index sets named by a filter. `None` means no
    /// axis was set (all ids pass); an empty set means no id matches.
    pub fn filtered_ids(&self, filter: &CategoryFilter) -> Option<BTreeSet<String>> {
        let mut result: Option<BTreeSet<String>> = None;

        let mut intersect = |set: Option<&BTreeSet<String>>| {
            let set = set.cloned().unwrap_or_default();
            result = Some(match result.take() {
                None => set,
                Some(acc) => acc.intersection(&set).cloned().collect(),
            });
        };

        if let Some(domain) = filter.domain {
            intersect(self.ids_for_domain(domain));
        }
        if let Some(level) = filter.level {
            intersect(self.ids_for_level(level));
        }
        if let Some(language) = filter.language {
            intersect(self.ids_for_language(language));
        }
        if let Some(priority) = filter.priority {
            intersect(self.ids_for_priority(priority));
        }
        if let Some(severity) = filter.severity {
            intersect(self.ids_for_severity(severity));
        }

        result
    }

    /// Ids indexed under exactly `token`.
    pub fn exact_hits(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.search.get(token)
    }

    /// (index token, ids) pairs where `token` is a strict prefix of the
    /// index token.
    pub fn prefix_hits<'a>(
        &'a self,
        token: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a BTreeSet<String>)> + 'a {
        self.search
            .iter()
            .filter(move |(indexed, _)| indexed.len() > token.len() && indexed.starts_with(token))
            .map(|(indexed, ids)| (indexed.as_str(), ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::category::tests::category;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("sql-injection"), vec!["sql", "injection"]);
        assert_eq!(
            tokenize("CVE-2021-44228 hits Log4j"),
            vec!["cve", "2021", "44228", "hits", "log4j"]
        );
        // single-char tokens dropped
        assert_eq!(tokenize("a SQL b"), vec!["sql"]);
        assert!(tokenize("!!!").is_empty());
    }

    #[test]
    fn test_insert_and_axis_lookup() {
        let mut index = CategoryIndex::new();
        let cat = category("sql-injection");
        index.insert(&cat);

        assert!(
            index
                .ids_for_domain(crate::types::Domain::Security)
                .unwrap()
                .contains("sql-injection")
        );
        assert!(
            index
                .ids_for_language(Language::Python)
                .unwrap()
                .contains("sql-injection")
        );
        assert!(
            index
                .ids_for_priority(Priority::P0)
                .unwrap()
                .contains("sql-injection")
        );
    }

    #[test]
    fn test_remove_clears_all_axes() {
        let mut index = CategoryIndex::new();
        let cat = category("sql-injection");
        index.insert(&cat);
        index.remove(&cat);

        assert!(
            index
                .ids_for_domain(crate::types::Domain::Security)
                .map(|s| s.is_empty())
                .unwrap_or(true)
        );
        assert!(index.exact_hits("sql").is_none());
    }

    #[test]
    fn test_filtered_ids_intersection() {
        let mut index = CategoryIndex::new();
        let sql = category("sql-injection");
        let mut missing_timeout = category("missing-timeout");
        missing_timeout.domain = crate::types::Domain::Reliability;
        index.insert(&sql);
        index.insert(&missing_timeout);

        let filter = CategoryFilter {
            domain: Some(crate::types::Domain::Security),
            language: Some(Language::Python),
            ..Default::default()
        };
        let ids = index.filtered_ids(&filter).unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("sql-injection"));

        // An axis with no members yields the empty set, not "all".
        let filter = CategoryFilter {
            language: Some(Language::Go),
            ..Default::default()
        };
        assert!(index.filtered_ids(&filter).unwrap().is_empty());

        // No axis set: None (caller treats as "all").
        assert!(index.filtered_ids(&CategoryFilter::default()).is_none());
    }

    #[test]
    fn test_search_hits() {
        let mut index = CategoryIndex::new();
        index.insert(&category("sql-injection"));

        assert!(index.exact_hits("injection").is_some());
        assert!(index.exact_hits("inject").is_none());

        let prefixed: Vec<&str> = index.prefix_hits("inject").map(|(t, _)| t).collect();
        assert_eq!(prefixed, vec!["injection"]);

        // Exact token is not its own prefix hit.
        assert_eq!(index.prefix_hits("injection").count(), 0);
    }
}
