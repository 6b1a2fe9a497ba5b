// SPDX-License-Identifier: PMPL-1.0-or-later
//! Normalized findings.
//!
//! Two producers feed the mapper: the rule engine, whose results are keyed by
//! rule id, and the bespoke probes, which address a criterion directly. Both
//! end up in the same [`Finding`] shape, built by [`normalize`] for engine
//! output and [`Finding::probe`] for probe output.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which result bucket a finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Violation,
    Pass,
    Inapplicable,
    Incomplete,
}

impl FindingKind {
    pub const ALL: [FindingKind; 4] = [
        FindingKind::Violation,
        FindingKind::Pass,
        FindingKind::Inapplicable,
        FindingKind::Incomplete,
    ];
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingKind::Violation => write!(f, "violation"),
            FindingKind::Pass => write!(f, "pass"),
            FindingKind::Inapplicable => write!(f, "inapplicable"),
            FindingKind::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// Severity reported by the engine. Only meaningful for violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    #[default]
    None,
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::None => write!(f, "none"),
            Impact::Minor => write!(f, "minor"),
            Impact::Moderate => write!(f, "moderate"),
            Impact::Serious => write!(f, "serious"),
            Impact::Critical => write!(f, "critical"),
        }
    }
}

/// One affected element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Serialized markup snippet
    pub html: String,
    /// CSS selector path, when the producer knows it
    pub selector: Option<String>,
    /// Free-text remediation hint, passed through untouched
    pub hint: Option<String>,
}

impl Target {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            selector: None,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// Where a finding came from, and so how it resolves to criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Origin {
    /// Rule-engine result, resolved through the catalog's rule index
    Engine,
    /// Bespoke probe result, bound to one criterion
    Probe { criterion_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub origin: Origin,
    pub kind: FindingKind,
    pub impact: Impact,
    /// Short human-readable rule summary
    pub help: Option<String>,
    pub targets: Vec<Target>,
}

impl Finding {
    /// Engine-sourced finding
    pub fn engine(rule_id: &str, kind: FindingKind) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            origin: Origin::Engine,
            kind,
            impact: Impact::None,
            help: None,
            targets: Vec::new(),
        }
    }

    /// Probe-sourced violation, bound directly to `criterion_id`
    pub fn probe(criterion_id: &str, rule_id: &str, impact: Impact, help: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            origin: Origin::Probe {
                criterion_id: criterion_id.to_string(),
            },
            kind: FindingKind::Violation,
            impact,
            help: Some(help.to_string()),
            targets: Vec::new(),
        }
    }

    pub fn with_impact(mut self, impact: Impact) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn is_violation(&self) -> bool {
        self.kind == FindingKind::Violation
    }
}

/// Raw rule-engine output: axe-core's v2 reporter shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineOutput {
    #[serde(default)]
    pub violations: Vec<EngineRule>,
    #[serde(default)]
    pub passes: Vec<EngineRule>,
    #[serde(default)]
    pub inapplicable: Vec<EngineRule>,
    #[serde(default)]
    pub incomplete: Vec<EngineRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRule {
    pub id: String,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub nodes: Vec<EngineNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineNode {
    #[serde(default)]
    pub html: String,
    /// Selector path; nested arrays appear for shadow DOM hosts
    #[serde(default)]
    pub target: Vec<serde_json::Value>,
    #[serde(default)]
    pub failure_summary: Option<String>,
}

impl EngineNode {
    fn selector(&self) -> Option<String> {
        let parts: Vec<String> = self
            .target
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" >> "))
        }
    }
}

impl EngineOutput {
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, PageError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Total entries across the four buckets
    pub fn len(&self) -> usize {
        self.violations.len() + self.passes.len() + self.inapplicable.len() + self.incomplete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket(&self, kind: FindingKind) -> &[EngineRule] {
        match kind {
            FindingKind::Violation => &self.violations,
            FindingKind::Pass => &self.passes,
            FindingKind::Inapplicable => &self.inapplicable,
            FindingKind::Incomplete => &self.incomplete,
        }
    }
}

/// Flatten engine output into findings: violations, passes, inapplicable,
/// incomplete, each bucket in engine-reported order.
pub fn normalize(output: &EngineOutput) -> Vec<Finding> {
    FindingKind::ALL
        .iter()
        .flat_map(|&kind| {
            output.bucket(kind).iter().map(move |rule| Finding {
                rule_id: rule.id.clone(),
                origin: Origin::Engine,
                kind,
                impact: rule.impact.unwrap_or_default(),
                help: rule.help.clone().or_else(|| rule.description.clone()),
                targets: rule
                    .nodes
                    .iter()
                    .map(|node| Target {
                        html: node.html.clone(),
                        selector: node.selector(),
                        hint: node.failure_summary.clone(),
                    })
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "testEngine": {"name": "axe-core", "version": "4.8.2"},
        "violations": [
            {
                "id": "image-alt",
                "impact": "critical",
                "help": "Images must have alternate text",
                "nodes": [
                    {"html": "<img src=\"a.png\">", "target": ["img"], "failureSummary": "Fix any of the following:\n  Element does not have an alt attribute"}
                ]
            }
        ],
        "passes": [
            {"id": "document-title", "impact": null, "nodes": [{"html": "<title>x</title>"}]}
        ],
        "inapplicable": [{"id": "frame-title", "nodes": []}],
        "incomplete": [{"id": "color-contrast", "impact": "serious", "nodes": [{"html": "<p>low</p>", "target": [["#host", "p"]]}]}]
    }"##;

    #[test]
    fn test_normalize_flattens_in_bucket_order() {
        let output = EngineOutput::from_json(SAMPLE).unwrap();
        assert_eq!(output.len(), 4);

        let findings = normalize(&output);
        let kinds: Vec<FindingKind> = findings.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, FindingKind::ALL.to_vec());
        assert!(findings.iter().all(|f| f.origin == Origin::Engine));
    }

    #[test]
    fn test_normalize_carries_targets_and_impact() {
        let findings = normalize(&EngineOutput::from_json(SAMPLE).unwrap());

        let violation = &findings[0];
        assert_eq!(violation.rule_id, "image-alt");
        assert_eq!(violation.impact, Impact::Critical);
        assert_eq!(violation.targets.len(), 1);
        assert_eq!(violation.targets[0].selector.as_deref(), Some("img"));
        assert!(violation.targets[0]
            .hint
            .as_deref()
            .unwrap()
            .starts_with("Fix any"));

        assert_eq!(findings[1].impact, Impact::None);
        assert_eq!(findings[2].impact, Impact::None);
        assert_eq!(
            findings[3].targets[0].selector.as_deref(),
            Some(r##"["#host","p"]"##)
        );
    }

    #[test]
    fn test_normalize_empty_output() {
        assert!(normalize(&EngineOutput::default()).is_empty());
        let output = EngineOutput::from_json("{}").unwrap();
        assert!(output.is_empty());
        assert!(normalize(&output).is_empty());
    }

    #[test]
    fn test_malformed_engine_output() {
        assert!(matches!(
            EngineOutput::from_json("[1, 2"),
            Err(PageError::EngineOutput(_))
        ));
    }

    #[test]
    fn test_probe_finding_shape() {
        let finding = Finding::probe("12.7", "skip-link-missing", Impact::Serious, "help")
            .with_target(Target::new("<html>...</html>").with_hint("add one"));
        assert_eq!(finding.kind, FindingKind::Violation);
        assert_eq!(
            finding.origin,
            Origin::Probe {
                criterion_id: "12.7".to_string()
            }
        );
        assert!(finding.is_violation());
        assert_eq!(finding.targets[0].hint.as_deref(), Some("add one"));
    }
}
