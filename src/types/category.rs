//! Category Schema
//!
//! Typed definitions for detection categories (declarative rule packs)
//! and their patterns, templates, and examples. Documents validate on
//! load; a category that fails [`Category::validate`] never enters the
//! store.
//!
//! Enum declaration order is load-bearing: `Priority` and `Severity`
//! derive `Ord` so that listing order (P0 before P1, critical before low)
//! falls out of the derives.

use serde::{Deserialize, Serialize};

use super::error::{PinataError, Result, ValidationIssue};
use super::language::Language;

// =============================================================================
// Closed Enums
// =============================================================================

/// Problem domain a category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Security,
    Data,
    Concurrency,
    Input,
    Resource,
    Reliability,
    Performance,
    Platform,
    Business,
    Compliance,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Data => "data",
            Self::Concurrency => "concurrency",
            Self::Input => "input",
            Self::Resource => "resource",
            Self::Reliability => "reliability",
            Self::Performance => "performance",
            Self::Platform => "platform",
            Self::Business => "business",
            Self::Compliance => "compliance",
        }
    }

    pub fn all() -> &'static [Domain] {
        &[
            Self::Security,
            Self::Data,
            Self::Concurrency,
            Self::Input,
            Self::Resource,
            Self::Reliability,
            Self::Performance,
            Self::Platform,
            Self::Business,
            Self::Compliance,
        ]
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .find(|d| d.as_str() == lower)
            .copied()
            .ok_or(())
    }
}

/// Test level the category targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestLevel {
    Unit,
    Integration,
    System,
    Chaos,
}

impl TestLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::System => "system",
            Self::Chaos => "chaos",
        }
    }

    pub fn all() -> &'static [TestLevel] {
        &[Self::Unit, Self::Integration, Self::System, Self::Chaos]
    }
}

impl std::fmt::Display for TestLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remediation priority. Declaration order gives P0 < P1 < P2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

impl Priority {
    /// Weight used in priority-score and penalty arithmetic.
    pub fn weight(&self) -> f64 {
        match self {
            Self::P0 => 3.0,
            Self::P1 => 2.0,
            Self::P2 => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding severity. Declaration order gives critical < high < medium < low,
/// so sorting ascending puts the worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Weight used in priority-score and penalty arithmetic.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Critical => 4.0,
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn all() -> &'static [Severity] {
        &[Self::Critical, Self::High, Self::Medium, Self::Low]
    }

    /// True when `self` is at least as severe as `threshold`.
    pub fn at_least(&self, threshold: Severity) -> bool {
        *self <= threshold
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence that a pattern hit is a true positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Weight used in priority-score and penalty arithmetic.
    pub fn weight(&self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// True when `self` is at least as confident as `threshold`.
    pub fn at_least(&self, threshold: Confidence) -> bool {
        *self <= threshold
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which backend executes a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Regex,
    Ast,
    Semantic,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Ast => "ast",
            Self::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Detection Pattern
// =============================================================================

/// One executable detection rule inside a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionPattern {
    /// Kebab-case pattern id, unique within the category
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    /// Language this pattern applies to
    pub language: Language,
    /// Pattern body; regex source, tree-sitter query, or semantic prompt
    pub pattern: String,
    /// Regex that suppresses nearby matches when it hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_pattern: Option<String>,
    pub confidence: Confidence,
    pub description: String,
    /// Frameworks this pattern is scoped to (informational)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,
}

// =============================================================================
// Templates & Examples
// =============================================================================

/// Synthesized-test template attached to a category. The core stores and
/// round-trips templates; rendering them is a collaborator's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTemplate {
    pub id: String,
    pub name: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub code: String,
}

/// Before/after code example attached to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExample {
    pub description: String,
    pub language: Language,
    /// The vulnerable or broken form this category detects
    pub vulnerable: String,
    /// The remediated form, when one is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
}

// =============================================================================
// Category
// =============================================================================

/// A declarative rule pack describing one class of code risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Stable kebab-case identifier, unique within a store
    pub id: String,
    /// Monotonically increasing schema version; replace requires a
    /// strictly greater value
    pub version: u32,
    pub name: String,
    pub description: String,
    pub domain: Domain,
    pub level: TestLevel,
    pub priority: Priority,
    pub severity: Severity,
    pub applicable_languages: Vec<Language>,
    pub patterns: Vec<DetectionPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TestTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<CodeExample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cves: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Kebab-case check: `^[a-z][a-z0-9-]*$`.
pub fn is_kebab_case(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl Category {
    /// Validate the document against the schema. Collects every issue
    /// rather than stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if !is_kebab_case(&self.id) {
            issues.push(
                ValidationIssue::new("id", "must be kebab-case")
                    .with_comparison("^[a-z][a-z0-9-]*$", &self.id),
            );
        }
        if self.version == 0 {
            issues.push(ValidationIssue::new("version", "must be strictly positive"));
        }
        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new("name", "must not be empty"));
        }
        if self.description.trim().is_empty() {
            issues.push(ValidationIssue::new("description", "must not be empty"));
        }
        if self.applicable_languages.is_empty() {
            issues.push(ValidationIssue::new(
                "applicableLanguages",
                "must contain at least one language",
            ));
        }
        if self.patterns.is_empty() {
            issues.push(ValidationIssue::new(
                "patterns",
                "must contain at least one pattern",
            ));
        }

        let mut seen_pattern_ids = std::collections::HashSet::new();
        for (idx, pattern) in self.patterns.iter().enumerate() {
            let field = format!("patterns[{}]", idx);
            if !is_kebab_case(&pattern.id) {
                issues.push(
                    ValidationIssue::new(format!("{}.id", field), "must be kebab-case")
                        .with_comparison("^[a-z][a-z0-9-]*$", &pattern.id),
                );
            }
            if !seen_pattern_ids.insert(pattern.id.clone()) {
                issues.push(ValidationIssue::new(
                    format!("{}.id", field),
                    format!("duplicate pattern id '{}'", pattern.id),
                ));
            }
            if pattern.pattern.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    format!("{}.pattern", field),
                    "must not be empty",
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(PinataError::validation(&self.id, issues))
        }
    }

    /// Look up a pattern by id.
    pub fn pattern(&self, pattern_id: &str) -> Result<&DetectionPattern> {
        self.patterns
            .iter()
            .find(|p| p.id == pattern_id)
            .ok_or_else(|| PinataError::not_found("pattern", pattern_id))
    }

    /// Condensed view for listings.
    pub fn summary(&self) -> CategorySummary {
        CategorySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            domain: self.domain,
            level: self.level,
            priority: self.priority,
            severity: self.severity,
            version: self.version,
            pattern_count: self.patterns.len(),
        }
    }
}

/// Condensed category view returned by store listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub domain: Domain,
    pub level: TestLevel,
    pub priority: Priority,
    pub severity: Severity,
    pub version: u32,
    pub pattern_count: usize,
}

/// Multi-axis filter applied by store listings and searches. Recognizes
/// exactly these five axes; each present axis intersects the result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<TestLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl CategoryFilter {
    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.level.is_none()
            && self.language.is_none()
            && self.priority.is_none()
            && self.severity.is_none()
    }

    /// Direct (index-free) check, used when filtering post-hoc.
    pub fn matches(&self, category: &Category) -> bool {
        if let Some(domain) = self.domain
            && category.domain != domain
        {
            return false;
        }
        if let Some(level) = self.level
            && category.level != level
        {
            return false;
        }
        if let Some(language) = self.language
            && !category.applicable_languages.contains(&language)
        {
            return false;
        }
        if let Some(priority) = self.priority
            && category.priority != priority
        {
            return false;
        }
        if let Some(severity) = self.severity
            && category.severity != severity
        {
            return false;
        }
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
