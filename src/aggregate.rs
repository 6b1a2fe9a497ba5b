// SPDX-License-Identifier: PMPL-1.0-or-later
//! Cross-page aggregation.
//!
//! A criterion is tested if any page tested it, and conformant only if it is
//! tested and violation-free on every page that tested it. Criteria nobody
//! tested are reported as untested, never as conformant.
//!
//! The aggregate is a pure function of the page reports and is recomputed
//! on every reporting pass.

use crate::catalog::Catalog;
use crate::mapper::PageReport;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Page id used when no page produced a report
pub const PLACEHOLDER_PAGE: &str = "(aucune page évaluée)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriterionStatus {
    Untested,
    Conformant,
    NonConformant,
}

impl CriterionStatus {
    /// French label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            CriterionStatus::Untested => "Non testé",
            CriterionStatus::Conformant => "Conforme",
            CriterionStatus::NonConformant => "Non conforme",
        }
    }
}

impl std::fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriterionStatus::Untested => write!(f, "untested"),
            CriterionStatus::Conformant => write!(f, "conformant"),
            CriterionStatus::NonConformant => write!(f, "non-conformant"),
        }
    }
}

/// Cross-page outcome for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionSummary {
    pub criterion_id: String,
    pub description: String,
    pub status: CriterionStatus,
    pub tested_anywhere: bool,
    pub conformant: bool,
    /// Violations summed over all pages
    pub violation_count: usize,
    /// Pages on which the criterion was tested
    pub pages_tested: usize,
    /// Pages on which it had at least one violation
    pub pages_failing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub criteria: Vec<CriterionSummary>,
}

impl CategoryBreakdown {
    pub fn count(&self, status: CriterionStatus) -> usize {
        self.criteria.iter().filter(|c| c.status == status).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub total_criteria: usize,
    pub tested: usize,
    pub conformant: usize,
    pub non_conformant: usize,
    pub untested: usize,
    pub total_violations: usize,
    /// round(conformant / tested * 100), 0 when nothing was tested
    pub conformity_percentage: u32,
    /// Page reports aggregated, failed ones included
    pub pages: usize,
    /// Page reports that were actually evaluated
    pub pages_evaluated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub stats: AggregateStats,
    /// Criteria grouped by category, catalog order
    pub categories: Vec<CategoryBreakdown>,
    /// No page produced a result: the input was empty or every page failed
    pub degraded: bool,
}

impl AggregateReport {
    pub fn criterion(&self, criterion_id: &str) -> Option<&CriterionSummary> {
        self.categories
            .iter()
            .flat_map(|c| c.criteria.iter())
            .find(|c| c.criterion_id == criterion_id)
    }

    pub fn criteria(&self) -> impl Iterator<Item = &CriterionSummary> {
        self.categories.iter().flat_map(|c| c.criteria.iter())
    }

    /// At least one criterion failed somewhere
    pub fn has_non_conformities(&self) -> bool {
        self.stats.non_conformant > 0
    }

    pub fn verdict(&self) -> Verdict {
        if self.degraded {
            Verdict::NotEvaluated
        } else if self.has_non_conformities() {
            Verdict::NonConformant
        } else {
            Verdict::Conformant
        }
    }
}

/// Overall outcome of an audit, as reported to CI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No tested criterion failed
    Conformant,
    /// At least one criterion failed
    NonConformant,
    /// No page could be evaluated
    NotEvaluated,
}

impl Verdict {
    /// Process exit status. 2 is left for fatal errors.
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Conformant => 0,
            Verdict::NonConformant => 1,
            Verdict::NotEvaluated => 3,
        }
    }
}

/// Conformity percentage with half-up rounding, 0 when `tested` is 0
pub fn conformity_percentage(conformant: usize, tested: usize) -> u32 {
    if tested == 0 {
        return 0;
    }
    ((conformant * 200 + tested) / (2 * tested)) as u32
}

/// Stand-in page reports used when nothing was evaluated: one all-untested
/// report per requested page, or a single placeholder page.
pub fn fallback_pages(requested: &[String], catalog: &Catalog) -> BTreeMap<String, PageReport> {
    if requested.is_empty() {
        return BTreeMap::from([(
            PLACEHOLDER_PAGE.to_string(),
            PageReport::untested(PLACEHOLDER_PAGE, catalog),
        )]);
    }
    requested
        .iter()
        .map(|page| (page.clone(), PageReport::untested(page, catalog)))
        .collect()
}

/// Combine page reports into cross-page statistics.
///
/// An empty input is not an error: the result is computed over a synthetic
/// all-untested page and flagged `degraded`.
pub fn aggregate(pages: &BTreeMap<String, PageReport>, catalog: &Catalog) -> AggregateReport {
    if pages.is_empty() {
        warn!("no page results to aggregate, falling back to an all-untested report");
        let mut report = aggregate_pages(&fallback_pages(&[], catalog), catalog);
        report.degraded = true;
        report.stats.pages = 0;
        report.stats.pages_evaluated = 0;
        return report;
    }
    let report = aggregate_pages(pages, catalog);
    if report.degraded {
        warn!(pages = pages.len(), "every page failed, report has no tested criteria");
    }
    report
}

fn aggregate_pages(pages: &BTreeMap<String, PageReport>, catalog: &Catalog) -> AggregateReport {
    let mut categories: Vec<CategoryBreakdown> = Vec::new();
    let mut tested = 0;
    let mut conformant = 0;
    let mut non_conformant = 0;
    let mut total_violations = 0;

    for criterion in catalog.all() {
        let mut summary = CriterionSummary {
            criterion_id: criterion.id.clone(),
            description: criterion.description.clone(),
            status: CriterionStatus::Untested,
            tested_anywhere: false,
            conformant: false,
            violation_count: 0,
            pages_tested: 0,
            pages_failing: 0,
        };

        for page in pages.values() {
            let Some(result) = page.get(&criterion.id) else {
                continue;
            };
            if !result.tested {
                continue;
            }
            summary.tested_anywhere = true;
            summary.pages_tested += 1;
            if result.has_violations() {
                summary.pages_failing += 1;
                summary.violation_count += result.violations.len();
            }
        }

        summary.conformant = summary.tested_anywhere && summary.violation_count == 0;
        summary.status = match (summary.tested_anywhere, summary.conformant) {
            (false, _) => CriterionStatus::Untested,
            (true, true) => CriterionStatus::Conformant,
            (true, false) => CriterionStatus::NonConformant,
        };

        if summary.tested_anywhere {
            tested += 1;
            if summary.conformant {
                conformant += 1;
            } else {
                non_conformant += 1;
            }
        }
        total_violations += summary.violation_count;

        match categories.last_mut() {
            Some(group) if group.category == criterion.category => group.criteria.push(summary),
            _ => categories.push(CategoryBreakdown {
                category: criterion.category.clone(),
                criteria: vec![summary],
            }),
        }
    }

    AggregateReport {
        stats: AggregateStats {
            total_criteria: catalog.len(),
            tested,
            conformant,
            non_conformant,
            untested: catalog.len() - tested,
            total_violations,
            conformity_percentage: conformity_percentage(conformant, tested),
            pages: pages.len(),
            pages_evaluated: pages.values().filter(|p| !p.is_failed()).count(),
        },
        categories,
        degraded: pages.values().all(PageReport::is_failed),
    }
}
