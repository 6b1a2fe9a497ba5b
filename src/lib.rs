// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rgaabot - RGAA 4.1 Accessibility Conformance Bot
//!
//! Part of the gitbot-fleet ecosystem. Rgaabot loads pages in a headless
//! browser, runs the axe-core rule engine on the rendered DOM, maps the
//! engine's rule results onto the RGAA 4.1 criteria, adds a few checks the
//! engine cannot express, and renders a static compliance report in French.
//!
//! ## Pipeline
//!
//! For each page: engine output is flattened by [`finding::normalize`],
//! projected onto the [`catalog::Catalog`] by the [`mapper`], then enriched
//! by the [`probes`]. The resulting [`mapper::PageReport`]s are combined by
//! [`aggregate::aggregate`] and rendered by [`report::render`].
//!
//! A criterion is conformant only if it was tested on at least one page and
//! had no violation on any page that tested it. Criteria no check covered
//! are reported as untested, never as conformant.
//!
//! ## Probes
//!
//! - **Presentation** (8.9): presentation-only tags
//! - **Zoom** (10.4): text clipped at 200% zoom
//! - **Landmarks** (12.6): missing or duplicated page regions
//! - **Skip link** (12.7): skip link present and pointing somewhere
//! - **Doctype** (8.1): HTML document type declared

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod finding;
pub mod mapper;
pub mod page;
pub mod probes;
pub mod report;
pub mod runner;
pub mod scanner;

pub use aggregate::{aggregate, AggregateReport, CriterionStatus, Verdict};
pub use catalog::{Catalog, Criterion};
pub use error::{Result, RgaaError};
pub use finding::{normalize, EngineOutput, Finding, FindingKind, Impact, Origin, Target};
pub use mapper::{map_to_page, CriterionResult, PageReport};
pub use runner::{run_batch, BatchOutcome};
