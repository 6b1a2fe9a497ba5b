// SPDX-License-Identifier: PMPL-1.0-or-later
//! Criterion mapper: projects one page's findings onto the catalog.
//!
//! Every catalog criterion gets exactly one [`CriterionResult`], tested or
//! not. Engine findings resolve through the catalog's rule index and may fan
//! out to several criteria; probe findings are bound to one criterion.
//! Findings that resolve to nothing are dropped.

use crate::catalog::Catalog;
use crate::finding::{Finding, FindingKind, Origin};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Per-page, per-criterion outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionResult {
    pub criterion_id: String,
    /// True iff at least one finding was attached or a probe covered the criterion
    pub tested: bool,
    pub violations: Vec<Arc<Finding>>,
    pub passes: Vec<Arc<Finding>>,
    pub inapplicable: Vec<Arc<Finding>>,
    pub incomplete: Vec<Arc<Finding>>,
}

impl CriterionResult {
    pub fn untested(criterion_id: &str) -> Self {
        Self {
            criterion_id: criterion_id.to_string(),
            tested: false,
            violations: Vec::new(),
            passes: Vec::new(),
            inapplicable: Vec::new(),
            incomplete: Vec::new(),
        }
    }

    pub fn bucket(&self, kind: FindingKind) -> &[Arc<Finding>] {
        match kind {
            FindingKind::Violation => &self.violations,
            FindingKind::Pass => &self.passes,
            FindingKind::Inapplicable => &self.inapplicable,
            FindingKind::Incomplete => &self.incomplete,
        }
    }

    fn bucket_mut(&mut self, kind: FindingKind) -> &mut Vec<Arc<Finding>> {
        match kind {
            FindingKind::Violation => &mut self.violations,
            FindingKind::Pass => &mut self.passes,
            FindingKind::Inapplicable => &mut self.inapplicable,
            FindingKind::Incomplete => &mut self.incomplete,
        }
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn finding_count(&self) -> usize {
        FindingKind::ALL.iter().map(|&k| self.bucket(k).len()).sum()
    }
}

/// Complete per-page result: one [`CriterionResult`] per catalog criterion,
/// in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub page_id: String,
    results: Vec<CriterionResult>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Set when the page could not be evaluated
    pub error: Option<String>,
}

impl PageReport {
    /// All criteria untested, no findings
    pub fn untested(page_id: &str, catalog: &Catalog) -> Self {
        PageReportBuilder::new(page_id, catalog).finish()
    }

    /// All criteria untested, with the reason the page failed
    pub fn failed(page_id: &str, catalog: &Catalog, error: impl Into<String>) -> Self {
        let mut report = Self::untested(page_id, catalog);
        report.error = Some(error.into());
        report
    }

    pub fn get(&self, criterion_id: &str) -> Option<&CriterionResult> {
        self.index.get(criterion_id).map(|&i| &self.results[i])
    }

    /// Results in catalog order
    pub fn results(&self) -> &[CriterionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn tested_count(&self) -> usize {
        self.results.iter().filter(|r| r.tested).count()
    }

    pub fn violation_count(&self) -> usize {
        self.results.iter().map(|r| r.violations.len()).sum()
    }
}

/// A page report under construction.
///
/// Handed to the probe runner so probes can attach findings and mark their
/// criterion tested; [`finish`](Self::finish) yields the immutable report.
#[derive(Debug)]
pub struct PageReportBuilder<'a> {
    catalog: &'a Catalog,
    report: PageReport,
    dropped: usize,
}

impl<'a> PageReportBuilder<'a> {
    pub fn new(page_id: &str, catalog: &'a Catalog) -> Self {
        let results: Vec<CriterionResult> = catalog
            .all()
            .iter()
            .map(|c| CriterionResult::untested(&c.id))
            .collect();
        let index = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.criterion_id.clone(), i))
            .collect();

        Self {
            catalog,
            report: PageReport {
                page_id: page_id.to_string(),
                results,
                index,
                error: None,
            },
            dropped: 0,
        }
    }

    /// Attach a finding to every criterion it resolves to.
    ///
    /// Returns how many criteria received it.
    pub fn attach(&mut self, finding: Finding) -> usize {
        let finding = Arc::new(finding);
        let targets: Vec<String> = match &finding.origin {
            Origin::Engine => self.catalog.lookup_by_rule_id(&finding.rule_id).to_vec(),
            Origin::Probe { criterion_id } => {
                if self.catalog.contains(criterion_id) {
                    vec![criterion_id.clone()]
                } else {
                    Vec::new()
                }
            }
        };

        if targets.is_empty() {
            debug!(rule = %finding.rule_id, "finding maps to no criterion, dropped");
            self.dropped += 1;
            return 0;
        }

        for criterion_id in &targets {
            if let Some(&i) = self.report.index.get(criterion_id) {
                let result = &mut self.report.results[i];
                result.bucket_mut(finding.kind).push(Arc::clone(&finding));
                result.tested = true;
            }
        }
        targets.len()
    }

    /// Mark a criterion tested without attaching anything. Unknown ids are ignored.
    pub fn mark_tested(&mut self, criterion_id: &str) -> bool {
        match self.report.index.get(criterion_id) {
            Some(&i) => {
                self.report.results[i].tested = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, criterion_id: &str) -> Option<&CriterionResult> {
        self.report.get(criterion_id)
    }

    /// Findings that resolved to no criterion so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn finish(self) -> PageReport {
        self.report
    }
}

/// Map a page's findings onto the catalog in one pass.
///
/// Bucket order is the order of `findings`.
pub fn map_to_page(
    page_id: &str,
    findings: impl IntoIterator<Item = Finding>,
    catalog: &Catalog,
) -> PageReport {
    let mut builder = PageReportBuilder::new(page_id, catalog);
    for finding in findings {
        builder.attach(finding);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Criterion;
    use crate::finding::Impact;

    fn catalog() -> Catalog {
        Catalog::from_criteria(vec![
            Criterion::new("1.1", "Images", "alt", ["image-alt"]),
            Criterion::new("1.3", "Images", "relevant alt", ["image-alt"]),
            Criterion::new("8.1", "Obligatoires", "doctype", Vec::<String>::new()),
            Criterion::new("11.1", "Formulaires", "labels", ["label"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_total_coverage_with_no_findings() {
        let catalog = catalog();
        let report = map_to_page("p", Vec::new(), &catalog);
        assert_eq!(report.len(), catalog.len());
        assert!(report.results().iter().all(|r| !r.tested));
        assert_eq!(report.tested_count(), 0);
    }

    #[test]
    fn test_shared_rule_fans_out() {
        let catalog = catalog();
        let finding = Finding::engine("image-alt", FindingKind::Violation).with_impact(Impact::Critical);
        let report = map_to_page("p", vec![finding.clone()], &catalog);

        let a = report.get("1.1").unwrap();
        let b = report.get("1.3").unwrap();
        assert!(a.tested && b.tested);
        assert_eq!(*a.violations[0], finding);
        assert!(Arc::ptr_eq(&a.violations[0], &b.violations[0]));
        assert!(!report.get("11.1").unwrap().tested);
        assert_eq!(report.violation_count(), 2);
    }

    #[test]
    fn test_unknown_rule_dropped() {
        let catalog = catalog();
        let mut builder = PageReportBuilder::new("p", &catalog);
        assert_eq!(builder.attach(Finding::engine("region", FindingKind::Violation)), 0);
        assert_eq!(builder.dropped(), 1);
        let report = builder.finish();
        assert_eq!(report.tested_count(), 0);
    }

    #[test]
    fn test_probe_binds_criterion_directly() {
        let catalog = catalog();
        let finding = Finding::probe("8.1", "doctype-missing", Impact::Serious, "doctype");
        let report = map_to_page("p", vec![finding], &catalog);
        let result = report.get("8.1").unwrap();
        assert!(result.tested);
        assert_eq!(result.violations.len(), 1);

        let stray = Finding::probe("99.9", "x", Impact::Minor, "x");
        let report = map_to_page("p", vec![stray], &catalog);
        assert_eq!(report.tested_count(), 0);
    }

    #[test]
    fn test_buckets_keep_insertion_order() {
        let catalog = catalog();
        let findings = vec![
            Finding::engine("label", FindingKind::Pass).with_help("first"),
            Finding::engine("label", FindingKind::Violation).with_help("second"),
            Finding::engine("label", FindingKind::Pass).with_help("third"),
            Finding::engine("label", FindingKind::Incomplete),
            Finding::engine("label", FindingKind::Inapplicable),
        ];
        let report = map_to_page("p", findings, &catalog);
        let result = report.get("11.1").unwrap();
        let passes: Vec<_> = result.passes.iter().map(|f| f.help.as_deref()).collect();
        assert_eq!(passes, vec![Some("first"), Some("third")]);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.finding_count(), 5);
    }

    #[test]
    fn test_mark_tested_without_findings() {
        let catalog = catalog();
        let mut builder = PageReportBuilder::new("p", &catalog);
        assert!(builder.mark_tested("8.1"));
        assert!(!builder.mark_tested("0.0"));
        let report = builder.finish();
        let result = report.get("8.1").unwrap();
        assert!(result.tested);
        assert_eq!(result.finding_count(), 0);
    }

    #[test]
    fn test_failed_page_is_untested() {
        let catalog = catalog();
        let report = PageReport::failed("p", &catalog, "timeout");
        assert!(report.is_failed());
        assert_eq!(report.len(), 4);
        assert_eq!(report.tested_count(), 0);
    }
}
