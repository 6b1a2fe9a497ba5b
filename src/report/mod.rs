// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for RGAA audits.
//!
//! Supports multiple output formats:
//! - HTML: self-contained French compliance report
//! - JSON: aggregate statistics and per-criterion statuses
//! - Text: console summary
//!
//! Rendering is pure: it reads the page reports and the catalog and returns
//! the document. [`write_report`] is the only function touching the disk.

pub mod html;

use crate::aggregate::{fallback_pages, AggregateReport, AggregateStats, CategoryBreakdown};
use crate::catalog::Catalog;
use crate::error::RenderError;
use crate::finding::Impact;
use crate::mapper::PageReport;
use chrono::{DateTime, Datelike, Local, Timelike};
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Self-contained HTML document
    Html,
    /// Structured JSON
    Json,
    /// Human-readable text
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Document-level details not derived from the results
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub title: String,
    pub generated_at: DateTime<Local>,
}

impl ReportMeta {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            generated_at: Local::now(),
        }
    }

    pub fn at(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Generation date in French, e.g. "3 mars 2025 à 14:05"
    pub fn date_label(&self) -> String {
        const MONTHS: [&str; 12] = [
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
            "septembre", "octobre", "novembre", "décembre",
        ];
        let d = &self.generated_at;
        format!(
            "{} {} {} à {:02}:{:02}",
            d.day(),
            MONTHS[d.month0() as usize],
            d.year(),
            d.hour(),
            d.minute()
        )
    }
}

/// Everything a renderer needs
pub(crate) struct ReportModel<'a> {
    pub pages: Cow<'a, BTreeMap<String, PageReport>>,
    /// Page ids to display, in display order
    pub order: Vec<String>,
    pub aggregate: &'a AggregateReport,
    pub meta: &'a ReportMeta,
}

impl<'a> ReportModel<'a> {
    fn new(
        pages: &'a BTreeMap<String, PageReport>,
        order: &[String],
        catalog: &Catalog,
        aggregate: &'a AggregateReport,
        meta: &'a ReportMeta,
    ) -> Self {
        let pages = if pages.is_empty() {
            Cow::Owned(fallback_pages(order, catalog))
        } else {
            Cow::Borrowed(pages)
        };
        let order = display_order(&pages, order);
        Self {
            pages,
            order,
            aggregate,
            meta,
        }
    }

    /// Pages that could not be evaluated
    pub fn failed_pages(&self) -> Vec<&PageReport> {
        self.order
            .iter()
            .filter_map(|id| self.pages.get(id))
            .filter(|p| p.is_failed())
            .collect()
    }
}

/// Requested order first, then any page missing from it in id order
fn display_order(pages: &BTreeMap<String, PageReport>, requested: &[String]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for id in requested {
        if pages.contains_key(id) && !order.contains(id) {
            order.push(id.clone());
        }
    }
    for id in pages.keys() {
        if !order.contains(id) {
            order.push(id.clone());
        }
    }
    order
}

/// Render the report for `pages`, listed in `order`, from their `aggregate`.
///
/// An empty `pages` map still yields a complete document: every criterion
/// is shown untested and the report is flagged degraded.
pub fn render(
    pages: &BTreeMap<String, PageReport>,
    order: &[String],
    catalog: &Catalog,
    aggregate: &AggregateReport,
    meta: &ReportMeta,
    format: OutputFormat,
) -> Result<String, RenderError> {
    let model = ReportModel::new(pages, order, catalog, aggregate, meta);
    match format {
        OutputFormat::Html => Ok(html::render_html(&model)),
        OutputFormat::Json => render_json(&model),
        OutputFormat::Text => Ok(render_text(&model)),
    }
}

/// Write a rendered report, creating parent directories as needed
pub fn write_report(path: &Path, content: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RenderError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// French label for an engine impact level
pub fn impact_label(impact: Impact) -> &'static str {
    match impact {
        Impact::Minor => "Mineur",
        Impact::Moderate => "Modéré",
        Impact::Serious => "Sérieux",
        Impact::Critical => "Critique",
        Impact::None => "Non précisé",
    }
}

static FIX_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^Fix .* of the following:").ok());

/// Replace the engine's English "Fix any of the following:" lead-in
pub fn translate_hint(hint: &str) -> Cow<'_, str> {
    match FIX_PREFIX.as_ref() {
        Some(re) => re.replace(hint, "Corriger les problèmes suivants :"),
        None => Cow::Borrowed(hint),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Short label for a page: the URL path without query or fragment, or the
/// id itself for files
pub fn page_label(page_id: &str) -> &str {
    match page_id.split_once("://") {
        Some((_, rest)) => {
            let rest = match rest.find(['?', '#']) {
                Some(end) => &rest[..end],
                None => rest,
            };
            match rest.find('/') {
                Some(i) => &rest[i..],
                None => "/",
            }
        }
        None => page_id,
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
fn excerpt(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    generated_at: String,
    degraded: bool,
    stats: &'a AggregateStats,
    pages: Vec<JsonPage<'a>>,
    categories: &'a [CategoryBreakdown],
}

#[derive(Serialize)]
struct JsonPage<'a> {
    id: &'a str,
    tested: usize,
    violations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn render_json(model: &ReportModel<'_>) -> Result<String, RenderError> {
    let pages = model
        .order
        .iter()
        .filter_map(|id| model.pages.get(id))
        .map(|page| JsonPage {
            id: &page.page_id,
            tested: page.tested_count(),
            violations: page.violation_count(),
            error: page.error.as_deref(),
        })
        .collect();

    let report = JsonReport {
        title: &model.meta.title,
        generated_at: model.meta.generated_at.to_rfc3339(),
        degraded: model.aggregate.degraded,
        stats: &model.aggregate.stats,
        pages,
        categories: &model.aggregate.categories,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_text(model: &ReportModel<'_>) -> String {
    let stats = &model.aggregate.stats;
    let mut output = String::new();

    output.push_str(&format!("=== {} ===\n", model.meta.title));
    output.push_str(&format!("Généré le {}\n\n", model.meta.date_label()));

    if model.aggregate.degraded {
        output.push_str("ATTENTION: aucune page n'a pu être évaluée, aucun critère n'est testé.\n\n");
    }

    output.push_str(&format!(
        "Critères testés: {} / {}\n",
        stats.tested, stats.total_criteria
    ));
    output.push_str(&format!(
        "Conformité globale: {}% ({} conformes, {} non conformes, {} non testés)\n",
        stats.conformity_percentage, stats.conformant, stats.non_conformant, stats.untested
    ));
    output.push_str(&format!(
        "Pages: {} évaluée(s) sur {}\n",
        stats.pages_evaluated, stats.pages
    ));
    output.push_str(&format!("Violations: {}\n", stats.total_violations));

    for page in model.failed_pages() {
        output.push_str(&format!(
            "  Page non évaluée: {} ({})\n",
            page.page_id,
            page.error.as_deref().unwrap_or("erreur inconnue")
        ));
    }

    for category in &model.aggregate.categories {
        output.push_str(&format!("\n=== {} ===\n", category.category));
        for criterion in &category.criteria {
            output.push_str(&format!(
                "{} - {}: {}\n",
                criterion.criterion_id,
                criterion.description,
                criterion.status.label()
            ));
            if criterion.violation_count > 0 {
                output.push_str(&format!(
                    "   Nombre de violations: {}\n",
                    criterion.violation_count
                ));
                push_text_violations(&mut output, model, &criterion.criterion_id);
            }
        }
    }

    output
}

fn push_text_violations(output: &mut String, model: &ReportModel<'_>, criterion_id: &str) {
    let results = model
        .order
        .iter()
        .filter_map(|id| model.pages.get(id))
        .filter_map(|page| page.get(criterion_id));
    for result in results {
        for violation in &result.violations {
            output.push_str(&format!("   - Règle: {}\n", violation.rule_id));
            output.push_str(&format!("   - Impact: {}\n", impact_label(violation.impact)));
            output.push_str(&format!(
                "   - Éléments concernés: {}\n",
                violation.targets.len()
            ));
            if let Some(first) = violation.targets.first() {
                output.push_str(&format!("   - Exemple: {}\n", excerpt(&first.html, 100)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::catalog::Criterion;
    use crate::finding::{Finding, FindingKind, Target};
    use crate::mapper::map_to_page;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::from_criteria(vec![
            Criterion::new("1.1", "Images", "Chaque image a-t-elle une alternative ?", ["image-alt"]),
            Criterion::new("11.1", "Formulaires", "Chaque champ a-t-il une étiquette ?", ["label"]),
        ])
        .unwrap()
    }

    fn meta() -> ReportMeta {
        ReportMeta::new("Rapport").at(Local.with_ymd_and_hms(2025, 3, 3, 14, 5, 0).unwrap())
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("HTML".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }

    #[test]
    fn test_date_label() {
        assert_eq!(meta().date_label(), "3 mars 2025 à 14:05");
    }

    #[test]
    fn test_labels_and_hints() {
        assert_eq!(impact_label(Impact::Serious), "Sérieux");
        assert_eq!(impact_label(Impact::Minor), "Mineur");
        assert_eq!(
            translate_hint("Fix any of the following:\n  Element has no alt"),
            "Corriger les problèmes suivants :\n  Element has no alt"
        );
        assert_eq!(translate_hint("Utilisez CSS"), "Utilisez CSS");
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_page_label() {
        assert_eq!(page_label("https://example.org/contact"), "/contact");
        assert_eq!(page_label("https://example.org/contact?x=1"), "/contact");
        assert_eq!(page_label("https://example.org/a/b#top"), "/a/b");
        assert_eq!(page_label("https://example.org?q=1"), "/");
        assert_eq!(page_label("https://example.org"), "/");
        assert_eq!(page_label("site/index.html"), "site/index.html");
    }

    #[test]
    fn test_display_order() {
        let catalog = catalog();
        let pages: BTreeMap<String, PageReport> = ["b", "a", "c"]
            .iter()
            .map(|id| (id.to_string(), PageReport::untested(id, &catalog)))
            .collect();
        let requested = vec!["c".to_string(), "x".to_string(), "a".to_string()];
        assert_eq!(display_order(&pages, &requested), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_json_report() {
        let catalog = catalog();
        let finding = Finding::engine("image-alt", FindingKind::Violation)
            .with_target(Target::new("<img>"));
        let pages = BTreeMap::from([(
            "p".to_string(),
            map_to_page("p", vec![finding], &catalog),
        )]);

        let report = aggregate(&pages, &catalog);
        let json = render(
            &pages,
            &["p".to_string()],
            &catalog,
            &report,
            &meta(),
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["tested"], 1);
        assert_eq!(value["stats"]["non_conformant"], 1);
        assert_eq!(value["degraded"], false);
        assert_eq!(value["pages"][0]["violations"], 1);
        assert_eq!(value["categories"][0]["criteria"][0]["status"], "non-conformant");
        assert_eq!(value["categories"][1]["criteria"][0]["status"], "untested");
    }

    #[test]
    fn test_text_report_empty_input() {
        let catalog = catalog();
        let pages = BTreeMap::new();
        let report = aggregate(&pages, &catalog);
        let text = render(&pages, &[], &catalog, &report, &meta(), OutputFormat::Text).unwrap();
        assert!(text.contains("aucune page n'a pu être évaluée"));
        assert!(text.contains("Critères testés: 0 / 2"));
        assert!(text.contains("Conformité globale: 0%"));
        assert!(text.contains("1.1 - Chaque image a-t-elle une alternative ?: Non testé\n"));
        assert!(text.contains("11.1 - Chaque champ a-t-il une étiquette ?: Non testé\n"));
    }

    #[test]
    fn test_text_report_lists_every_criterion() {
        let catalog = catalog();
        let long_html = format!("<img src=\"{}.png\">", "a".repeat(120));
        let finding = Finding::engine("image-alt", FindingKind::Violation)
            .with_impact(Impact::Critical)
            .with_targets(vec![Target::new(&long_html), Target::new("<img>")]);
        let pages = BTreeMap::from([(
            "p".to_string(),
            map_to_page("p", vec![finding], &catalog),
        )]);
        let report = aggregate(&pages, &catalog);
        let text = render(
            &pages,
            &["p".to_string()],
            &catalog,
            &report,
            &meta(),
            OutputFormat::Text,
        )
        .unwrap();

        assert!(text.contains("\n=== Images ===\n"));
        assert!(text.contains("\n=== Formulaires ===\n"));
        assert!(text.contains("1.1 - Chaque image a-t-elle une alternative ?: Non conforme\n"));
        assert!(text.contains("   Nombre de violations: 1\n"));
        assert!(text.contains("   - Règle: image-alt\n"));
        assert!(text.contains("   - Impact: Critique\n"));
        assert!(text.contains("   - Éléments concernés: 2\n"));
        let example = format!("   - Exemple: {}...\n", &long_html[..100]);
        assert!(text.contains(&example));
        assert!(text.contains("11.1 - Chaque champ a-t-il une étiquette ?: Non testé\n"));
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("court", 100), "court");
        assert_eq!(excerpt("éééé", 2), "éé...");
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports/nested/rapport.html");
        write_report(&path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_report_unwritable() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let result = write_report(&blocker.join("rapport.html"), "x");
        assert!(matches!(result, Err(RenderError::CreateDir { .. })));
    }
}
