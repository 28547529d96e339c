//! Detection Results and Gaps
//!
//! A [`DetectionResult`] is one raw pattern hit located in a file. A
//! [`Gap`] enriches a result with its category's classification and a
//! computed priority score used for ranking.
//!
//! The match context is a closed struct rather than a free-form bag:
//! every hit carries the matched text and its column span, plus a typed
//! per-backend extension.

use serde::{Deserialize, Serialize};

use super::category::{Confidence, Domain, PatternType, Priority, Severity, TestLevel};

// =============================================================================
// Match Context
// =============================================================================

/// Backend-specific detail attached to a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MatchDetail {
    /// Plain regex hit
    Regex,
    /// AST query hit; `capture` is the primary capture name that fired
    Ast { capture: String },
    /// Produced by an injected semantic matcher
    Semantic { source: String },
}

/// Location and text details for one match.
///
/// Columns are 0-based byte offsets within their line. For AST captures
/// spanning multiple lines, `column_start` is the capture's start column
/// on its first line and `column_end` its end column on its last line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchContext {
    pub match_text: String,
    pub column_start: u32,
    pub column_end: u32,
    #[serde(flatten)]
    pub detail: MatchDetail,
}

// =============================================================================
// Detection Result
// =============================================================================

/// One raw pattern hit. Lines are 1-based and `line_end >= line_start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub pattern_id: String,
    pub category_id: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    /// Rendered snippet: match lines marked `>`, one context line either
    /// side, capped at the snippet line limit
    pub code_snippet: String,
    pub confidence: Confidence,
    pub context: MatchContext,
}

// =============================================================================
// Gap
// =============================================================================

/// An enriched, ranked detection result intended for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    #[serde(flatten)]
    pub detection: DetectionResult,
    pub domain: Domain,
    pub level: TestLevel,
    pub priority: Priority,
    pub severity: Severity,
    pub pattern_type: PatternType,
    pub priority_score: f64,
}

impl Gap {
    /// `severity_weight x confidence_weight x priority_weight`.
    pub fn priority_score_for(
        severity: Severity,
        confidence: Confidence,
        priority: Priority,
    ) -> f64 {
        severity.weight() * confidence.weight() * priority.weight()
    }

    /// Deterministic ranking key: score descending, then
    /// (file path, line start, pattern id) ascending.
    pub fn ranking_cmp(&self, other: &Gap) -> std::cmp::Ordering {
        other
            .priority_score
            .partial_cmp(&self.priority_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.detection.file_path.cmp(&other.detection.file_path))
            .then_with(|| self.detection.line_start.cmp(&other.detection.line_start))
            .then_with(|| self.detection.pattern_id.cmp(&other.detection.pattern_id))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn detection(file: &str, line: u32) -> DetectionResult {
        DetectionResult {
            pattern_id: "execute-fstring".to_string(),
            category_id: "sql-injection".to_string(),
            file_path: file.to_string(),
            line_start: line,
            line_end: line,
            code_snippet: String::new(),
            confidence: Confidence::High,
            context: MatchContext {
                match_text: "execute(f\"".to_string(),
                column_start: 7,
                column_end: 17,
                detail: MatchDetail::Regex,
            },
        }
    }

    fn gap(file: &str, line: u32, severity: Severity) -> Gap {
        Gap {
            detection: detection(file, line),
            domain: Domain::Security,
            level: TestLevel::Unit,
            priority: Priority::P0,
            severity,
            pattern_type: PatternType::Regex,
            priority_score: Gap::priority_score_for(severity, Confidence::High, Priority::P0),
        }
    }

    #[test]
    fn test_priority_score() {
        // critical(4) x high(3) x P0(3)
        assert_eq!(
            Gap::priority_score_for(Severity::Critical, Confidence::High, Priority::P0),
            36.0
        );
        // low(1) x low(1) x P2(1)
        assert_eq!(
            Gap::priority_score_for(Severity::Low, Confidence::Low, Priority::P2),
            1.0
        );
    }

    #[test]
    fn test_ranking_score_desc() {
        let critical = gap("a.py", 1, Severity::Critical);
        let low = gap("a.py", 1, Severity::Low);
        assert_eq!(critical.ranking_cmp(&low), std::cmp::Ordering::Less);
        assert_eq!(low.ranking_cmp(&critical), std::cmp::Ordering::Greater);
    }

    #[test]
    fn test_ranking_tie_break() {
        let a = gap("a.py", 5, Severity::High);
        let b = gap("b.py", 1, Severity::High);
        // Equal score: file path ascending wins.
        assert_eq!(a.ranking_cmp(&b), std::cmp::Ordering::Less);

        let early = gap("a.py", 1, Severity::High);
        let late = gap("a.py", 9, Severity::High);
        assert_eq!(early.ranking_cmp(&late), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_context_serialization() {
        let result = detection("db.py", 3);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"matchText\""));
        assert!(json.contains("\"columnStart\":7"));
        assert!(json.contains("\"type\":\"regex\""));

        let parsed: DetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_ast_detail_round_trip() {
        let context = MatchContext {
            match_text: "cursor.execute(query)".to_string(),
            column_start: 0,
            column_end: 21,
            detail: MatchDetail::Ast {
                capture: "vulnerable-call".to_string(),
            },
        };
        let json = serde_json::to_string(&context).unwrap();
        assert!(json.contains("\"type\":\"ast\""));
        let parsed: MatchContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, context);
    }
}
