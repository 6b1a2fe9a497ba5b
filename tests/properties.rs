// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property tests for mapping and aggregation

use proptest::prelude::*;
use rgaabot::aggregate::{aggregate, conformity_percentage, CriterionStatus};
use rgaabot::catalog::{Catalog, Criterion};
use rgaabot::finding::{Finding, FindingKind};
use rgaabot::mapper::{map_to_page, PageReport};
use std::collections::{BTreeMap, BTreeSet};

const MAPPED_RULES: usize = 6;

fn rule(i: usize) -> String {
    format!("r{}", i)
}

fn kind() -> impl Strategy<Value = FindingKind> {
    prop_oneof![
        Just(FindingKind::Violation),
        Just(FindingKind::Pass),
        Just(FindingKind::Incomplete),
        Just(FindingKind::Inapplicable),
    ]
}

/// Criteria `1.0`..`1.n` spread over three categories, each mapped to a
/// subset of `r0`..`r5`
fn catalog() -> impl Strategy<Value = Catalog> {
    prop::collection::vec(
        prop::collection::btree_set(0..MAPPED_RULES, 0..3),
        1..12,
    )
    .prop_map(|rule_sets| {
        let criteria = rule_sets
            .into_iter()
            .enumerate()
            .map(|(i, rules)| {
                Criterion::new(
                    &format!("1.{}", i),
                    &format!("C{}", i % 3),
                    &format!("critère {}", i),
                    rules.into_iter().map(rule),
                )
            })
            .collect();
        Catalog::from_criteria(criteria).expect("generated catalog is valid")
    })
}

/// Findings over `r0`..`r7`; `r6` and `r7` are never mapped
fn findings(max: usize) -> impl Strategy<Value = Vec<Finding>> {
    prop::collection::vec((0..MAPPED_RULES + 2, kind()), 0..max).prop_map(|raw| {
        raw.into_iter()
            .map(|(r, k)| Finding::engine(&rule(r), k))
            .collect()
    })
}

fn pages(catalog: &Catalog, per_page: Vec<Vec<Finding>>) -> BTreeMap<String, PageReport> {
    per_page
        .into_iter()
        .enumerate()
        .map(|(i, findings)| {
            let id = format!("page-{}", i);
            let report = map_to_page(&id, findings, catalog);
            (id, report)
        })
        .collect()
}

proptest! {
    #[test]
    fn page_report_covers_every_criterion(catalog in catalog(), findings in findings(20)) {
        let report = map_to_page("p", findings, &catalog);
        prop_assert_eq!(report.len(), catalog.len());
        for (result, criterion) in report.results().iter().zip(catalog.all()) {
            prop_assert_eq!(&result.criterion_id, &criterion.id);
        }
    }

    #[test]
    fn unmapped_findings_test_nothing(
        catalog in catalog(),
        raw in prop::collection::vec((MAPPED_RULES..MAPPED_RULES + 2, kind()), 0..10),
    ) {
        let findings: Vec<Finding> =
            raw.into_iter().map(|(r, k)| Finding::engine(&rule(r), k)).collect();
        let report = map_to_page("p", findings, &catalog);
        prop_assert_eq!(report.tested_count(), 0);
        prop_assert_eq!(report.violation_count(), 0);
    }

    #[test]
    fn aggregate_is_deterministic(
        catalog in catalog(),
        per_page in prop::collection::vec(findings(10), 0..4),
    ) {
        let pages = pages(&catalog, per_page);
        prop_assert_eq!(aggregate(&pages, &catalog), aggregate(&pages, &catalog));
    }

    #[test]
    fn conformant_and_untested_are_exclusive(
        catalog in catalog(),
        per_page in prop::collection::vec(findings(10), 1..4),
    ) {
        let pages = pages(&catalog, per_page);
        let report = aggregate(&pages, &catalog);

        let mut tested = BTreeSet::new();
        for summary in report.criteria() {
            prop_assert_eq!(summary.conformant, summary.status == CriterionStatus::Conformant);
            if summary.status == CriterionStatus::Untested {
                prop_assert!(!summary.tested_anywhere);
                prop_assert!(!summary.conformant);
            } else {
                tested.insert(summary.criterion_id.clone());
            }
        }

        prop_assert_eq!(report.stats.tested, tested.len());
        prop_assert_eq!(
            report.stats.tested,
            report.stats.conformant + report.stats.non_conformant
        );
        prop_assert_eq!(
            report.stats.total_criteria,
            report.stats.tested + report.stats.untested
        );
    }

    #[test]
    fn percentage_rounds_half_up(tested in 1usize..500, conformant_seed in 0usize..500) {
        let conformant = conformant_seed % (tested + 1);
        let p = conformity_percentage(conformant, tested) as usize;
        prop_assert!(p <= 100);
        // p is the nearest integer to 100c/t, ties going up
        prop_assert!((2 * p + 1) * tested > 200 * conformant);
        if p > 0 {
            prop_assert!((2 * p - 1) * tested <= 200 * conformant);
        }
    }
}

#[test]
fn test_percentage_without_tested_criteria() {
    assert_eq!(conformity_percentage(0, 0), 0);
}
