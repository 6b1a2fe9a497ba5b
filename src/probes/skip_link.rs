// SPDX-License-Identifier: PMPL-1.0-or-later
//! Skip link probe - RGAA 12.7
//!
//! A skip link is an in-page anchor whose text mentions skipping to the
//! content. With none on the page only `skip-link-missing` is reported;
//! otherwise each candidate whose fragment names no element id is listed
//! in a single `skip-link-invalid` finding.

use super::{Probe, SKIP_LINK_CRITERION};
use crate::error::ProbeError;
use crate::finding::{Finding, Impact, Target};
use crate::page::{ElementInfo, PageHandle};
use async_trait::async_trait;

/// Lowercase words identifying a skip link by its text
pub const SKIP_LINK_WORDS: [&str; 7] = [
    "passer",
    "éviter",
    "contenu",
    "principal",
    "skip",
    "content",
    "main",
];

const IN_PAGE_ANCHORS: &str = "a[href^=\"#\"]";

pub struct SkipLinkProbe;

fn is_skip_link(el: &ElementInfo) -> bool {
    let text = el.text.to_lowercase();
    SKIP_LINK_WORDS.iter().any(|word| text.contains(word))
}

#[async_trait]
impl Probe for SkipLinkProbe {
    fn name(&self) -> &str {
        "Skip Link Probe"
    }

    fn description(&self) -> &str {
        "Checks for a working link to the main content (RGAA 12.7)"
    }

    fn criterion_id(&self) -> &'static str {
        SKIP_LINK_CRITERION
    }

    async fn run(&self, page: &dyn PageHandle) -> Result<Vec<Finding>, ProbeError> {
        let candidates: Vec<ElementInfo> = page
            .select(IN_PAGE_ANCHORS)
            .await?
            .into_iter()
            .filter(is_skip_link)
            .collect();

        if candidates.is_empty() {
            return Ok(vec![Finding::probe(
                SKIP_LINK_CRITERION,
                "skip-link-missing",
                Impact::Serious,
                "Un lien d'évitement ou d'accès rapide à la zone de contenu principal doit être présent",
            )
            .with_target(Target::new("<html>...</html>").with_hint(
                "Aucun lien d'évitement n'a été trouvé. Ajoutez un lien au début de la page \
                 pour permettre d'accéder directement au contenu principal.",
            ))]);
        }

        let mut invalid = Vec::new();
        for link in candidates {
            let href = link.href.clone().unwrap_or_default();
            let fragment = href.strip_prefix('#').unwrap_or(&href);
            if page.has_element_id(fragment).await? {
                continue;
            }
            let hint = format!(
                "Le lien d'évitement \"{}\" pointe vers une cible inexistante ({}). \
                 Assurez-vous que l'identifiant cible existe dans la page.",
                link.text.trim(),
                href
            );
            invalid.push(
                Target::new(link.html)
                    .with_selector(format!("a[href=\"{}\"]", href))
                    .with_hint(hint),
            );
        }

        if invalid.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::probe(
            SKIP_LINK_CRITERION,
            "skip-link-invalid",
            Impact::Serious,
            "Les liens d'évitement doivent pointer vers des cibles valides",
        )
        .with_targets(invalid)])
    }
}
