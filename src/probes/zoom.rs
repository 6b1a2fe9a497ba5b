// SPDX-License-Identifier: PMPL-1.0-or-later
//! Text zoom probe - RGAA 10.4
//!
//! Zooms the page body to 200% and looks for text clipped by
//! `overflow: hidden`. Needs a laid-out page, so it is skipped on static HTML.

use super::{with_zoom, Probe, ZOOM_CRITERION};
use crate::error::ProbeError;
use crate::finding::{Finding, Impact, Target};
use crate::page::PageHandle;
use async_trait::async_trait;

pub const ZOOM_LEVEL: &str = "200%";

pub struct ZoomProbe;

#[async_trait]
impl Probe for ZoomProbe {
    fn name(&self) -> &str {
        "Text Zoom Probe"
    }

    fn description(&self) -> &str {
        "Checks text stays readable at 200% zoom (RGAA 10.4)"
    }

    fn criterion_id(&self) -> &'static str {
        ZOOM_CRITERION
    }

    async fn run(&self, page: &dyn PageHandle) -> Result<Vec<Finding>, ProbeError> {
        let clipped = with_zoom(page, ZOOM_LEVEL, page.clipped_text_elements()).await?;

        if clipped.is_empty() {
            return Ok(Vec::new());
        }

        let targets = clipped.into_iter().map(|el| {
            Target::new(el.html).with_hint(
                "Le texte est tronqué ou masqué lorsque le zoom est à 200%. \
                 Utilisez des unités relatives et des mises en page flexibles.",
            )
        });

        Ok(vec![Finding::probe(
            ZOOM_CRITERION,
            "text-zoom-readability",
            Impact::Serious,
            "Le texte doit rester lisible lorsque la taille est augmentée à 200%",
        )
        .with_targets(targets)])
    }
}
