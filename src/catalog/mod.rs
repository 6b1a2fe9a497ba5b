// SPDX-License-Identifier: PMPL-1.0-or-later
//! RGAA criterion catalog.
//!
//! The catalog is static reference data: every criterion, its description,
//! its thematic category and the rule-engine identifiers able to detect a
//! violation of it. It is validated once at startup and never mutated.
//!
//! Criteria are kept in a stable order: dotted ids compare segment by
//! segment (numeric segments numerically, before alphabetic ones), and
//! categories appear in the order of their first criterion.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// RGAA 4.1 catalog shipped with the crate.
const RGAA_4_1: &str = include_str!("../../data/rgaa-4.1.toml");

/// One testable accessibility requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Dotted hierarchical id, e.g. "9.1"
    pub id: String,
    /// Thematic grouping label, e.g. "Images"
    #[serde(default)]
    pub category: String,
    /// Human-readable requirement text
    #[serde(default)]
    pub description: String,
    /// Engine rules able to detect a violation. Empty means no automated rule.
    #[serde(default)]
    pub rule_ids: BTreeSet<String>,
}

impl Criterion {
    pub fn new<I, S>(id: &str, category: &str, description: &str, rule_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            rule_ids: rule_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether at least one engine rule covers this criterion
    pub fn is_automated(&self) -> bool {
        !self.rule_ids.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    criterion: Vec<Criterion>,
}

/// Validated, ordered criterion catalog with a rule-id index.
#[derive(Debug, Clone)]
pub struct Catalog {
    criteria: Vec<Criterion>,
    positions: HashMap<String, usize>,
    by_rule: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Load the embedded RGAA 4.1 catalog
    pub fn rgaa() -> Result<Self, CatalogError> {
        Self::from_toml_str(RGAA_4_1)
    }

    /// Load a catalog from a TOML file with `[[criterion]]` tables
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_criteria(file.criterion)
    }

    /// Validate and index a set of criteria.
    ///
    /// Fails on an empty set, a duplicate or malformed id, or a criterion
    /// missing its category or description.
    pub fn from_criteria(criteria: Vec<Criterion>) -> Result<Self, CatalogError> {
        if criteria.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = BTreeSet::new();
        for criterion in &criteria {
            if criterion.id.is_empty() || criterion.id.split('.').any(|s| s.trim().is_empty()) {
                return Err(CatalogError::InvalidId(criterion.id.clone()));
            }
            if !seen.insert(criterion.id.as_str()) {
                return Err(CatalogError::DuplicateId(criterion.id.clone()));
            }
            if criterion.category.trim().is_empty() {
                return Err(CatalogError::MissingCategory(criterion.id.clone()));
            }
            if criterion.description.trim().is_empty() {
                return Err(CatalogError::MissingDescription(criterion.id.clone()));
            }
        }

        let criteria = order_criteria(criteria);

        let positions = criteria
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let mut by_rule: HashMap<String, Vec<String>> = HashMap::new();
        for criterion in &criteria {
            for rule in &criterion.rule_ids {
                by_rule
                    .entry(rule.clone())
                    .or_default()
                    .push(criterion.id.clone());
            }
        }

        Ok(Self {
            criteria,
            positions,
            by_rule,
        })
    }

    /// Criterion ids a rule maps to, in catalog order. Empty for unknown rules.
    pub fn lookup_by_rule_id(&self, rule_id: &str) -> &[String] {
        self.by_rule.get(rule_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All criteria in catalog order
    pub fn all(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.positions.get(id).map(|&i| &self.criteria[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Position of a criterion in catalog order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Category labels in catalog order, each listed once
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for criterion in &self.criteria {
            if categories.last() != Some(&criterion.category.as_str()) {
                categories.push(&criterion.category);
            }
        }
        categories
    }

    /// Criteria belonging to one category, in catalog order
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Criterion> {
        self.criteria.iter().filter(move |c| c.category == category)
    }

    /// Number of distinct engine rules known to the catalog
    pub fn rule_count(&self) -> usize {
        self.by_rule.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Num(u64),
    Text(String),
}

fn id_key(id: &str) -> Vec<Segment> {
    id.split('.')
        .map(|s| match s.trim().parse::<u64>() {
            Ok(n) => Segment::Num(n),
            Err(_) => Segment::Text(s.trim().to_string()),
        })
        .collect()
}

/// Compare two dotted criterion ids
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    id_key(a).cmp(&id_key(b)).then_with(|| a.cmp(b))
}

fn order_criteria(mut criteria: Vec<Criterion>) -> Vec<Criterion> {
    criteria.sort_by(|a, b| compare_ids(&a.id, &b.id));

    let mut category_rank: HashMap<String, usize> = HashMap::new();
    for criterion in &criteria {
        let next = category_rank.len();
        category_rank.entry(criterion.category.clone()).or_insert(next);
    }

    // Stable sort keeps id order inside each category.
    criteria.sort_by_key(|c| category_rank[&c.category]);
    criteria
}
