// SPDX-License-Identifier: PMPL-1.0-or-later
//! Doctype probe - RGAA 8.1

use super::{Probe, DOCTYPE_CRITERION};
use crate::error::ProbeError;
use crate::finding::{Finding, Impact, Target};
use crate::page::PageHandle;
use async_trait::async_trait;

pub struct DoctypeProbe;

#[async_trait]
impl Probe for DoctypeProbe {
    fn name(&self) -> &str {
        "Doctype Probe"
    }

    fn description(&self) -> &str {
        "Checks the page declares the HTML document type (RGAA 8.1)"
    }

    fn criterion_id(&self) -> &'static str {
        DOCTYPE_CRITERION
    }

    async fn run(&self, page: &dyn PageHandle) -> Result<Vec<Finding>, ProbeError> {
        let finding = match page.doctype().await? {
            None => Finding::probe(
                DOCTYPE_CRITERION,
                "doctype-missing",
                Impact::Serious,
                "Chaque page web doit être définie par un type de document",
            )
            .with_target(Target::new("<html>...</html>").with_hint(
                "La page ne contient pas de déclaration de type de document (DOCTYPE). \
                 Ajoutez <!DOCTYPE html> au début du document.",
            )),
            Some(doctype) if !doctype.name.eq_ignore_ascii_case("html") => Finding::probe(
                DOCTYPE_CRITERION,
                "doctype-invalid",
                Impact::Serious,
                "Chaque page web doit être définie par un type de document valide",
            )
            .with_target(Target::new(doctype.declaration()).with_hint(
                "La déclaration de type de document n'est pas valide. \
                 Utilisez <!DOCTYPE html> pour HTML5.",
            )),
            Some(_) => return Ok(Vec::new()),
        };
        Ok(vec![finding])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    async fn rules(html: &str) -> Vec<String> {
        DoctypeProbe
            .run(&StaticPage::from_html("p", html))
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.rule_id)
            .collect()
    }

    #[tokio::test]
    async fn test_html5_doctype() {
        assert!(rules("<!DOCTYPE html><html></html>").await.is_empty());
        assert!(rules("<!doctype HTML><html></html>").await.is_empty());
        assert!(rules(
            "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\"><html></html>"
        )
        .await
        .is_empty());
    }

    #[tokio::test]
    async fn test_missing_doctype() {
        assert_eq!(rules("<html><body></body></html>").await, vec!["doctype-missing"]);
    }

    #[tokio::test]
    async fn test_non_html_doctype() {
        assert_eq!(
            rules("<!DOCTYPE svg><html></html>").await,
            vec!["doctype-invalid"]
        );
    }
}
