// SPDX-License-Identifier: PMPL-1.0-or-later
//! Presentation markup probe - RGAA 8.9
//!
//! Flags tags whose only purpose is visual styling. One finding per page,
//! one target per offending element, grouped by tag.

use super::{Probe, PRESENTATION_CRITERION};
use crate::error::ProbeError;
use crate::finding::{Finding, Impact, Target};
use crate::page::PageHandle;
use async_trait::async_trait;

pub const PRESENTATION_TAGS: [&str; 7] = ["b", "i", "u", "center", "font", "marquee", "blink"];

pub struct PresentationProbe;

#[async_trait]
impl Probe for PresentationProbe {
    fn name(&self) -> &str {
        "Presentation Markup Probe"
    }

    fn description(&self) -> &str {
        "Detects tags used only for presentation (RGAA 8.9)"
    }

    fn criterion_id(&self) -> &'static str {
        PRESENTATION_CRITERION
    }

    async fn run(&self, page: &dyn PageHandle) -> Result<Vec<Finding>, ProbeError> {
        let mut targets = Vec::new();
        for tag in PRESENTATION_TAGS {
            for el in page.select(tag).await? {
                targets.push(Target::new(el.html).with_selector(tag).with_hint(format!(
                    "La balise <{}> est utilisée à des fins de présentation. Utilisez CSS à la place.",
                    tag
                )));
            }
        }

        if targets.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::probe(
            PRESENTATION_CRITERION,
            "presentation-tags",
            Impact::Moderate,
            "Éviter d'utiliser des balises à des fins de présentation uniquement",
        )
        .with_targets(targets)])
    }
}
