// SPDX-License-Identifier: PMPL-1.0-or-later
//! Batch orchestration
//!
//! Each page runs the same pipeline: engine evaluation, normalization,
//! mapping onto the catalog, then the probes in order. Pages share nothing
//! but the read-only catalog, so up to `concurrency` of them run at once;
//! the batch joins them all before anything is aggregated.
//!
//! A page that cannot be opened or evaluated is recorded with every
//! criterion untested. It never aborts the batch.

use crate::aggregate::{aggregate, AggregateReport};
use crate::catalog::Catalog;
use crate::error::PageError;
use crate::finding::normalize;
use crate::mapper::{PageReport, PageReportBuilder};
use crate::page::{PageHandle, PageSource};
use crate::probes::{run_probes, Probe};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// A page that produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page_id: String,
    pub error: String,
}

/// Result of evaluating a set of pages
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One report per requested page, failed pages included
    pub pages: BTreeMap<String, PageReport>,
    /// Requested page ids, deduplicated, in request order
    pub order: Vec<String>,
    pub failures: Vec<PageFailure>,
}

impl BatchOutcome {
    /// Every page failed for the same reason, e.g. the browser never started
    pub fn all_failed(requested: &[String], catalog: &Catalog, error: &str) -> Self {
        let order = dedup(requested);
        warn!("No page evaluated: {}", error);
        let pages = order
            .iter()
            .map(|id| (id.clone(), PageReport::failed(id, catalog, error)))
            .collect();
        let failures = order
            .iter()
            .map(|id| PageFailure {
                page_id: id.clone(),
                error: error.to_string(),
            })
            .collect();
        Self {
            pages,
            order,
            failures,
        }
    }

    pub fn requested(&self) -> usize {
        self.order.len()
    }

    /// Pages that produced a result
    pub fn evaluated(&self) -> usize {
        self.requested() - self.failures.len()
    }

    pub fn aggregate(&self, catalog: &Catalog) -> AggregateReport {
        aggregate(&self.pages, catalog)
    }
}

fn dedup(pages: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    pages
        .iter()
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

/// Evaluate one loaded page: engine findings first, then probe findings
#[instrument(skip(page, catalog, probes), fields(page = page.id()))]
pub async fn evaluate_page(
    page: &dyn PageHandle,
    catalog: &Catalog,
    probes: &[Box<dyn Probe>],
) -> Result<PageReport, PageError> {
    let output = page.evaluate().await?;
    let findings = normalize(&output);
    debug!("Engine reported {} finding(s)", findings.len());

    let mut builder = PageReportBuilder::new(page.id(), catalog);
    for finding in findings {
        builder.attach(finding);
    }
    if builder.dropped() > 0 {
        debug!("{} finding(s) matched no criterion", builder.dropped());
    }

    let summary = run_probes(page, probes, &mut builder).await;

    let report = builder.finish();
    info!(
        tested = report.tested_count(),
        violations = report.violation_count(),
        probes_skipped = summary.skipped.len(),
        "Page evaluated"
    );
    Ok(report)
}

async fn audit_page(
    source: &dyn PageSource,
    page_id: &str,
    catalog: &Catalog,
    probes: &[Box<dyn Probe>],
) -> Result<PageReport, PageError> {
    let page = source.open(page_id).await?;
    let result = evaluate_page(page.as_ref(), catalog, probes).await;
    if let Err(e) = page.close().await {
        warn!(page = page_id, "Failed to close page: {}", e);
    }
    result
}

/// Evaluate `pages` with at most `concurrency` in flight.
///
/// Duplicate ids are evaluated once. A warning is logged when fewer pages
/// were evaluated than requested.
#[instrument(skip_all, fields(requested = pages.len(), concurrency = concurrency))]
pub async fn run_batch(
    source: &dyn PageSource,
    pages: &[String],
    catalog: &Catalog,
    probes: &[Box<dyn Probe>],
    concurrency: usize,
) -> BatchOutcome {
    let order = dedup(pages);
    let concurrency = concurrency.max(1);
    info!("Evaluating {} page(s)", order.len());

    let results: Vec<(String, Result<PageReport, PageError>)> = stream::iter(order.iter().cloned())
        .map(|page_id| async move {
            let result = audit_page(source, &page_id, catalog, probes).await;
            (page_id, result)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut reports = BTreeMap::new();
    let mut failures = Vec::new();
    for (page_id, result) in results {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(page = %page_id, "Page evaluation failed, criteria left untested: {}", e);
                failures.push(PageFailure {
                    page_id: page_id.clone(),
                    error: e.to_string(),
                });
                PageReport::failed(&page_id, catalog, e.to_string())
            }
        };
        reports.insert(page_id, report);
    }

    // Report failures in request order, not completion order
    failures.sort_by_key(|f| order.iter().position(|id| *id == f.page_id));

    let outcome = BatchOutcome {
        pages: reports,
        order,
        failures,
    };
    if outcome.evaluated() < outcome.requested() {
        warn!(
            "Only {} of {} requested page(s) were evaluated",
            outcome.evaluated(),
            outcome.requested()
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CriterionStatus;
    use crate::catalog::Criterion;
    use crate::finding::EngineOutput;
    use crate::page::StaticPage;
    use crate::probes::default_probes;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MemorySource {
        pages: HashMap<String, StaticPage>,
    }

    impl MemorySource {
        fn new(pages: Vec<StaticPage>) -> Self {
            Self {
                pages: pages.into_iter().map(|p| (p.id().to_string(), p)).collect(),
            }
        }
    }

    #[async_trait]
    impl PageSource for MemorySource {
        async fn open(&self, page_id: &str) -> Result<Box<dyn PageHandle>, PageError> {
            match self.pages.get(page_id) {
                Some(page) => Ok(Box::new(page.clone())),
                None => Err(PageError::Navigation {
                    url: page_id.to_string(),
                    message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                }),
            }
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_criteria(vec![
            Criterion::new("1.1", "Images", "alt", ["image-alt"]),
            Criterion::new("8.1", "Éléments obligatoires", "doctype", Vec::<String>::new()),
            Criterion::new("11.1", "Formulaires", "label", ["label"]),
        ])
        .unwrap()
    }

    fn engine(json: &str) -> EngineOutput {
        EngineOutput::from_json(json).unwrap()
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_engine_and_probe_findings_combined() {
        let catalog = catalog();
        let page = StaticPage::from_html("p1", "<html><body><img src=a.png></body></html>")
            .with_engine_output(engine(
                r#"{"violations": [{"id": "image-alt", "impact": "critical", "nodes": [{"html": "<img src=\"a.png\">"}]}]}"#,
            ));

        let report = evaluate_page(&page, &catalog, &default_probes()).await.unwrap();
        assert_eq!(report.len(), 3);
        assert!(report.get("1.1").unwrap().has_violations());
        let doctype = report.get("8.1").unwrap();
        assert!(doctype.tested);
        assert_eq!(doctype.violations[0].rule_id, "doctype-missing");
        assert!(!report.get("11.1").unwrap().tested);
    }

    #[tokio::test]
    async fn test_failed_page_does_not_abort_batch() {
        let catalog = catalog();
        let source = MemorySource::new(vec![
            StaticPage::from_html("a", "<!DOCTYPE html><html></html>"),
            StaticPage::from_html("c", "<html></html>"),
        ]);

        let outcome = run_batch(
            &source,
            &ids(&["c", "b", "a", "c"]),
            &catalog,
            &default_probes(),
            2,
        )
        .await;

        assert_eq!(outcome.order, ids(&["c", "b", "a"]));
        assert_eq!(outcome.requested(), 3);
        assert_eq!(outcome.evaluated(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].page_id, "b");

        let failed = &outcome.pages["b"];
        assert!(failed.is_failed());
        assert_eq!(failed.tested_count(), 0);
        assert_eq!(failed.len(), catalog.len());

        let aggregate = outcome.aggregate(&catalog);
        assert!(!aggregate.degraded);
        assert_eq!(aggregate.stats.pages, 3);
        assert_eq!(aggregate.stats.pages_evaluated, 2);
        assert_eq!(
            aggregate.criterion("8.1").unwrap().status,
            CriterionStatus::NonConformant
        );
    }

    #[tokio::test]
    async fn test_engine_failure_marks_page_failed() {
        struct BrokenEngine;

        #[async_trait]
        impl PageSource for BrokenEngine {
            async fn open(&self, _page_id: &str) -> Result<Box<dyn PageHandle>, PageError> {
                Err(PageError::Engine("axe is not defined".to_string()))
            }
        }

        let catalog = catalog();
        let outcome = run_batch(&BrokenEngine, &ids(&["x"]), &catalog, &default_probes(), 1).await;
        assert_eq!(outcome.evaluated(), 0);
        assert!(outcome.aggregate(&catalog).degraded);
    }

    #[test]
    fn test_all_failed() {
        let catalog = catalog();
        let outcome = BatchOutcome::all_failed(&ids(&["a", "b"]), &catalog, "no browser");
        assert_eq!(outcome.evaluated(), 0);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.pages["a"].error.as_deref(), Some("no browser"));
        let aggregate = outcome.aggregate(&catalog);
        assert!(aggregate.degraded);
        assert_eq!(aggregate.stats.tested, 0);
    }
}
