//! Scan Reports
//!
//! Output shapes of a scan: coverage buckets, the aggregate score with
//! its letter grade, file statistics, and the top-level [`ScanResult`].
//! All fields round-trip losslessly through serde so out-of-scope
//! reporters can consume them in any serialization.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::{Domain, Severity, TestLevel};
use super::detection::Gap;
use super::language::Language;

// =============================================================================
// Coverage
// =============================================================================

/// Per-axis coverage bucket. A category is *covered* when it was
/// evaluated and produced no gaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageBucket {
    pub scanned: u32,
    pub with_gaps: u32,
    pub covered: u32,
    pub coverage_percent: u32,
}

impl CoverageBucket {
    pub fn new(scanned: u32, with_gaps: u32) -> Self {
        let covered = scanned.saturating_sub(with_gaps);
        let coverage_percent = if scanned == 0 {
            100
        } else {
            (100.0 * covered as f64 / scanned as f64).round() as u32
        };
        Self {
            scanned,
            with_gaps,
            covered,
            coverage_percent,
        }
    }
}

/// Coverage across the evaluated category set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageMetrics {
    pub by_domain: BTreeMap<Domain, CoverageBucket>,
    pub by_level: BTreeMap<TestLevel, CoverageBucket>,
    /// `round(100 x covered / evaluated)`, or 100 when nothing evaluated
    pub overall_percent: u32,
}

// =============================================================================
// Score
// =============================================================================

/// Letter grade derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// One score deduction, retained for the top deductions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePenalty {
    pub description: String,
    pub amount: f64,
}

/// One score addition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBonus {
    pub description: String,
    pub amount: f64,
}

/// Aggregate quality score for a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinataScore {
    /// Clamped to [0, 100]
    pub overall: u32,
    pub grade: Grade,
    pub by_domain: BTreeMap<Domain, u32>,
    pub by_severity: BTreeMap<Severity, u32>,
    /// Largest deductions, capped at the retention limit
    pub penalties: Vec<ScorePenalty>,
    pub bonuses: Vec<ScoreBonus>,
}

impl Default for PinataScore {
    fn default() -> Self {
        Self {
            overall: 100,
            grade: Grade::A,
            by_domain: BTreeMap::new(),
            by_severity: BTreeMap::new(),
            penalties: Vec::new(),
            bonuses: Vec::new(),
        }
    }
}

// =============================================================================
// File Stats & Summary
// =============================================================================

/// File-level statistics for a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_files: u32,
    pub files_with_gaps: u32,
    pub by_language: BTreeMap<Language, u32>,
    pub test_files: u32,
    pub source_files: u32,
}

/// Compact scan summary with the highest-ranked gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_gaps: u32,
    pub categories_evaluated: u32,
    /// The three highest-ranked gaps
    pub top_gaps: Vec<Gap>,
}

// =============================================================================
// Scan Result
// =============================================================================

/// Full output of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub target_directory: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Ranked: priority score descending, ties by (file, line, pattern)
    pub gaps: Vec<Gap>,
    pub gaps_by_category: BTreeMap<String, Vec<Gap>>,
    pub gaps_by_file: BTreeMap<String, Vec<Gap>>,
    pub coverage: CoverageMetrics,
    pub file_stats: FileStats,
    pub score: PinataScore,
    pub warnings: Vec<String>,
    pub summary: ScanSummary,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_bucket() {
        let bucket = CoverageBucket::new(4, 1);
        assert_eq!(bucket.covered, 3);
        assert_eq!(bucket.coverage_percent, 75);

        let empty = CoverageBucket::new(0, 0);
        assert_eq!(empty.coverage_percent, 100);

        let third = CoverageBucket::new(3, 2);
        assert_eq!(third.coverage_percent, 33);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(80), Grade::B);
        assert_eq!(Grade::from_score(79), Grade::C);
        assert_eq!(Grade::from_score(70), Grade::C);
        assert_eq!(Grade::from_score(69), Grade::D);
        assert_eq!(Grade::from_score(60), Grade::D);
        assert_eq!(Grade::from_score(59), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn test_default_score_is_perfect() {
        let score = PinataScore::default();
        assert_eq!(score.overall, 100);
        assert_eq!(score.grade, Grade::A);
    }

    #[test]
    fn test_scan_result_round_trip() {
        use crate::types::category::{Priority, TestLevel};
        use crate::types::detection::MatchDetail;
        use crate::types::{Confidence, MatchContext, PatternType};

        let gap = Gap {
            detection: crate::types::DetectionResult {
                pattern_id: "execute-fstring".to_string(),
                category_id: "sql-injection".to_string(),
                file_path: "src/db.py".to_string(),
                line_start: 3,
                line_end: 3,
                code_snippet: ">3    cursor.execute(f\"...\")".to_string(),
                confidence: Confidence::High,
                context: MatchContext {
                    match_text: "execute(f\"".to_string(),
                    column_start: 7,
                    column_end: 17,
                    detail: MatchDetail::Regex,
                },
            },
            domain: Domain::Security,
            level: TestLevel::Unit,
            priority: Priority::P0,
            severity: Severity::Critical,
            pattern_type: PatternType::Regex,
            priority_score: 36.0,
        };

        let mut coverage = CoverageMetrics::default();
        coverage.by_domain.insert(Domain::Security, CoverageBucket::new(1, 1));
        coverage.overall_percent = 0;

        let result = ScanResult {
            target_directory: "/repo".to_string(),
            started_at: "2026-01-15T10:00:00Z".parse().unwrap(),
            finished_at: "2026-01-15T10:00:02Z".parse().unwrap(),
            duration_ms: 2000,
            gaps: vec![gap.clone()],
            gaps_by_category: [("sql-injection".to_string(), vec![gap.clone()])].into(),
            gaps_by_file: [("src/db.py".to_string(), vec![gap.clone()])].into(),
            coverage,
            file_stats: FileStats {
                total_files: 1,
                files_with_gaps: 1,
                by_language: [(Language::Python, 1)].into(),
                test_files: 0,
                source_files: 1,
            },
            score: PinataScore::default(),
            warnings: vec!["walk error: denied".to_string()],
            summary: ScanSummary {
                total_gaps: 1,
                categories_evaluated: 1,
                top_gaps: vec![gap],
            },
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_score_serialization() {
        let mut score = PinataScore::default();
        score.by_domain.insert(Domain::Security, 58);
        score.penalties.push(ScorePenalty {
            description: "critical sql-injection in db.py:3".to_string(),
            amount: 41.57,
        });

        let json = serde_json::to_string(&score).unwrap();
        assert!(json.contains("\"grade\":\"A\""));
        assert!(json.contains("\"security\":58"));

        let parsed: PinataScore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, score);
    }
}
