// SPDX-License-Identifier: PMPL-1.0-or-later
//! Bespoke page probes for RGAA criteria the rule engine cannot express.
//!
//! Each probe inspects one page and returns the violations it found against
//! its own criterion. The probe runner marks that criterion tested whenever
//! the probe completes, whether or not it found anything. A probe that fails
//! leaves its criterion untested and does not stop the others.

pub mod doctype;
pub mod landmarks;
pub mod presentation;
pub mod skip_link;
pub mod zoom;

use crate::error::ProbeError;
use crate::finding::Finding;
use crate::mapper::PageReportBuilder;
use crate::page::PageHandle;
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, warn};

/// 8.9 Tags used only for presentation
pub const PRESENTATION_CRITERION: &str = "8.9";
/// 10.4 Text readable at 200% zoom
pub const ZOOM_CRITERION: &str = "10.4";
/// 12.6 Content grouping regions
pub const LANDMARKS_CRITERION: &str = "12.6";
/// 12.7 Skip link to the main content
pub const SKIP_LINK_CRITERION: &str = "12.7";
/// 8.1 Document type
pub const DOCTYPE_CRITERION: &str = "8.1";

/// Trait implemented by all probes
#[async_trait]
pub trait Probe: Send + Sync {
    /// Human-readable name of this probe
    fn name(&self) -> &str;

    /// Short description of what this probe checks
    fn description(&self) -> &str;

    /// Criterion this probe covers
    fn criterion_id(&self) -> &'static str;

    /// Inspect the page. Findings must target [`Probe::criterion_id`].
    async fn run(&self, page: &dyn PageHandle) -> Result<Vec<Finding>, ProbeError>;
}

/// All probes, in the order they run on a page
pub fn default_probes() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(presentation::PresentationProbe),
        Box::new(zoom::ZoomProbe),
        Box::new(landmarks::LandmarksProbe),
        Box::new(skip_link::SkipLinkProbe),
        Box::new(doctype::DoctypeProbe),
    ]
}

/// Criterion ids covered by the default probes
pub fn probed_criteria() -> Vec<&'static str> {
    default_probes().iter().map(|p| p.criterion_id()).collect()
}

/// What happened when the probes ran on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Names of probes that completed
    pub ran: Vec<String>,
    /// Probes that failed, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Run `probes` sequentially against `page`, recording results in `report`
pub async fn run_probes(
    page: &dyn PageHandle,
    probes: &[Box<dyn Probe>],
    report: &mut PageReportBuilder<'_>,
) -> ProbeSummary {
    let mut summary = ProbeSummary::default();

    for probe in probes {
        match probe.run(page).await {
            Ok(findings) => {
                debug!(
                    page = page.id(),
                    probe = probe.name(),
                    "{} violation(s)",
                    findings.len()
                );
                report.mark_tested(probe.criterion_id());
                for finding in findings {
                    report.attach(finding);
                }
                summary.ran.push(probe.name().to_string());
            }
            Err(e) => {
                warn!(
                    page = page.id(),
                    probe = probe.name(),
                    "Probe skipped, criterion {} left untested: {}",
                    probe.criterion_id(),
                    e
                );
                summary.skipped.push((probe.name().to_string(), e.to_string()));
            }
        }
    }

    summary
}

/// Run `body` with the page zoomed to `level`, then restore the previous zoom.
///
/// `body` is not polled until the zoom is applied. The previous value is
/// restored on every path, including when `body` fails.
pub async fn with_zoom<T, F>(page: &dyn PageHandle, level: &str, body: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    let original = page.zoom().await?;

    if let Err(e) = page.set_zoom(level).await {
        let _ = page.set_zoom(&original).await;
        return Err(e);
    }

    let outcome = body.await;
    let restored = page.set_zoom(&original).await;

    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore)) => {
            warn!(page = page.id(), "Zoom not restored: {}", restore);
            Err(e)
        }
    }
}
