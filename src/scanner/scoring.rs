//! Score Computation
//!
//! Aggregates ranked gaps into the overall score. Scoring starts at 100;
//! every gap deducts `base x severity x confidence x sqrt(priority)`
//! from the overall and double that from its domain and severity
//! buckets. Coverage and clean-severity bonuses are added after the
//! penalties, then everything clamps to [0, 100].

use std::collections::BTreeMap;

use crate::constants::scoring::{
    BASE_PENALTY, BUCKET_PENALTY_FACTOR, COVERAGE_BONUS_HIGH, COVERAGE_BONUS_HIGH_THRESHOLD,
    COVERAGE_BONUS_LOW, COVERAGE_BONUS_LOW_THRESHOLD, MAX_RETAINED_PENALTIES, NO_CRITICAL_BONUS,
    NO_HIGH_BONUS,
};
use crate::types::{
    Category, CoverageMetrics, Domain, Gap, Grade, PinataScore, ScoreBonus, ScorePenalty, Severity,
};

pub(crate) fn compute_score(
    evaluated: &[&Category],
    gaps: &[Gap],
    coverage: &CoverageMetrics,
) -> PinataScore {
    let mut overall = 100.0f64;
    let mut by_domain: BTreeMap<Domain, f64> = evaluated
        .iter()
        .map(|category| (category.domain, 100.0))
        .collect();
    let mut by_severity: BTreeMap<Severity, f64> = evaluated
        .iter()
        .map(|category| (category.severity, 100.0))
        .collect();

    let mut penalties: Vec<ScorePenalty> = Vec::new();
    let mut bonuses: Vec<ScoreBonus> = Vec::new();

    for gap in gaps {
        let amount = BASE_PENALTY
            * gap.severity.weight()
            * gap.detection.confidence.weight()
            * gap.priority.weight().sqrt();
        overall -= amount;

        let bucket_amount = amount * BUCKET_PENALTY_FACTOR;
        let domain_score = by_domain.entry(gap.domain).or_insert(100.0);
        *domain_score = (*domain_score - bucket_amount).max(0.0);
        let severity_score = by_severity.entry(gap.severity).or_insert(100.0);
        *severity_score = (*severity_score - bucket_amount).max(0.0);

        penalties.push(ScorePenalty {
            description: format!(
                "{} {} in {}:{}",
                gap.severity,
                gap.detection.category_id,
                gap.detection.file_path,
                gap.detection.line_start
            ),
            amount,
        });
    }

    if coverage.overall_percent >= COVERAGE_BONUS_HIGH_THRESHOLD {
        overall += COVERAGE_BONUS_HIGH;
        bonuses.push(ScoreBonus {
            description: format!("coverage at {}%", coverage.overall_percent),
            amount: COVERAGE_BONUS_HIGH,
        });
    } else if coverage.overall_percent >= COVERAGE_BONUS_LOW_THRESHOLD {
        overall += COVERAGE_BONUS_LOW;
        bonuses.push(ScoreBonus {
            description: format!("coverage at {}%", coverage.overall_percent),
            amount: COVERAGE_BONUS_LOW,
        });
    }

    if !evaluated.is_empty() {
        if !gaps.iter().any(|gap| gap.severity == Severity::Critical) {
            overall += NO_CRITICAL_BONUS;
            bonuses.push(ScoreBonus {
                description: "no critical gaps".to_string(),
                amount: NO_CRITICAL_BONUS,
            });
        }
        if !gaps.iter().any(|gap| gap.severity == Severity::High) {
            overall += NO_HIGH_BONUS;
            bonuses.push(ScoreBonus {
                description: "no high gaps".to_string(),
                amount: NO_HIGH_BONUS,
            });
        }
    }

    penalties.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.description.cmp(&b.description))
    });
    penalties.truncate(MAX_RETAINED_PENALTIES);

    let overall = overall.clamp(0.0, 100.0).round() as u32;
    PinataScore {
        overall,
        grade: Grade::from_score(overall),
        by_domain: by_domain
            .into_iter()
            .map(|(domain, score)| (domain, score.clamp(0.0, 100.0).round() as u32))
            .collect(),
        by_severity: by_severity
            .into_iter()
            .map(|(severity, score)| (severity, score.clamp(0.0, 100.0).round() as u32))
            .collect(),
        penalties,
        bonuses,
    }
}
