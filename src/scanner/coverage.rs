//! Coverage Computation
//!
//! Buckets the evaluated categories by domain and level, counting which
//! produced gaps. A category is covered when it was evaluated and no gap
//! survived ranking.

use std::collections::{BTreeMap, HashSet};

use crate::types::{Category, CoverageBucket, CoverageMetrics, Domain, Gap, TestLevel};

pub(crate) fn compute_coverage(evaluated: &[&Category], gaps: &[Gap]) -> CoverageMetrics {
    let with_gaps: HashSet<&str> = gaps
        .iter()
        .map(|gap| gap.detection.category_id.as_str())
        .collect();

    let mut domain_counts: BTreeMap<Domain, (u32, u32)> = BTreeMap::new();
    let mut level_counts: BTreeMap<TestLevel, (u32, u32)> = BTreeMap::new();
    let mut covered_total = 0u32;

    for category in evaluated {
        let gapped = with_gaps.contains(category.id.as_str());
        if !gapped {
            covered_total += 1;
        }

        let domain = domain_counts.entry(category.domain).or_default();
        domain.0 += 1;
        if gapped {
            domain.1 += 1;
        }

        let level = level_counts.entry(category.level).or_default();
        level.0 += 1;
        if gapped {
            level.1 += 1;
        }
    }

    let overall_percent = if evaluated.is_empty() {
        100
    } else {
        (100.0 * covered_total as f64 / evaluated.len() as f64).round() as u32
    };

    CoverageMetrics {
        by_domain: domain_counts
            .into_iter()
            .map(|(domain, (scanned, gapped))| (domain, CoverageBucket::new(scanned, gapped)))
            .collect(),
        by_level: level_counts
            .into_iter()
            .map(|(level, (scanned, gapped))| (level, CoverageBucket::new(scanned, gapped)))
            .collect(),
        overall_percent,
    }
}
