// SPDX-License-Identifier: PMPL-1.0-or-later
//! Landmark regions probe - RGAA 12.6
//!
//! Every page needs header, navigation, main, footer and search regions,
//! and at most one header, main and footer. Missing and duplicated regions
//! are reported as two separate findings.

use super::{Probe, LANDMARKS_CRITERION};
use crate::error::ProbeError;
use crate::finding::{Finding, Impact, Target};
use crate::page::PageHandle;
use async_trait::async_trait;

/// Region name and the selector matching it
pub const LANDMARKS: [(&str, &str); 5] = [
    ("header", "header, [role=\"banner\"]"),
    ("nav", "nav, [role=\"navigation\"]"),
    ("main", "main, [role=\"main\"]"),
    ("footer", "footer, [role=\"contentinfo\"]"),
    ("search", "[role=\"search\"]"),
];

/// Regions that must be unique
pub const UNIQUE_LANDMARKS: [&str; 3] = ["header", "main", "footer"];

pub struct LandmarksProbe;

#[async_trait]
impl Probe for LandmarksProbe {
    fn name(&self) -> &str {
        "Landmark Regions Probe"
    }

    fn description(&self) -> &str {
        "Checks content grouping regions are present and unique (RGAA 12.6)"
    }

    fn criterion_id(&self) -> &'static str {
        LANDMARKS_CRITERION
    }

    async fn run(&self, page: &dyn PageHandle) -> Result<Vec<Finding>, ProbeError> {
        let mut missing = Vec::new();
        let mut duplicated = Vec::new();

        for (name, selector) in LANDMARKS {
            let count = page.count(selector).await?;
            if count == 0 {
                missing.push(name);
            } else if count > 1 && UNIQUE_LANDMARKS.contains(&name) {
                duplicated.push((name, count));
            }
        }

        let mut findings = Vec::new();

        if !missing.is_empty() {
            findings.push(
                Finding::probe(
                    LANDMARKS_CRITERION,
                    "missing-landmarks",
                    Impact::Moderate,
                    "Les zones de regroupement de contenus doivent être présentes",
                )
                .with_target(Target::new("<html>...</html>").with_hint(format!(
                    "Les zones suivantes sont manquantes : {}. Utilisez les balises \
                     sémantiques appropriées ou les attributs ARIA correspondants.",
                    missing.join(", ")
                ))),
            );
        }

        if !duplicated.is_empty() {
            let targets = duplicated.into_iter().map(|(name, count)| {
                Target::new(format!("<{0}>...</{0}>", name)).with_hint(format!(
                    "La zone {} est présente {} fois. Il ne devrait y avoir qu'une seule \
                     instance de cette zone.",
                    name, count
                ))
            });
            findings.push(
                Finding::probe(
                    LANDMARKS_CRITERION,
                    "duplicate-landmarks",
                    Impact::Moderate,
                    "Les zones de regroupement de contenus ne doivent pas être dupliquées",
                )
                .with_targets(targets),
            );
        }

        Ok(findings)
    }
}
