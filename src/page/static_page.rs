// SPDX-License-Identifier: PMPL-1.0-or-later
//! Saved-HTML page handle.
//!
//! Parses the document with `scraper` and replays engine output recorded
//! alongside it (`page.html.axe.json`). Used by `rgaabot scan` and by tests.

use super::{Doctype, ElementInfo, PageHandle, PageSource};
use crate::error::{PageError, ProbeError};
use crate::finding::EngineOutput;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of recorded engine output next to a saved page
pub const ENGINE_SIDECAR_SUFFIX: &str = ".axe.json";

#[derive(Debug, Clone)]
pub struct StaticPage {
    id: String,
    source: String,
    engine: EngineOutput,
}

impl StaticPage {
    pub fn from_html(id: &str, html: &str) -> Self {
        Self {
            id: id.to_string(),
            source: html.to_string(),
            engine: EngineOutput::default(),
        }
    }

    /// Replay this engine output from [`PageHandle::evaluate`]
    pub fn with_engine_output(mut self, engine: EngineOutput) -> Self {
        self.engine = engine;
        self
    }

    /// Load a saved page plus its engine sidecar, if any
    pub fn from_file(path: &Path, engine_dir: Option<&Path>) -> Result<Self, PageError> {
        let html = std::fs::read_to_string(path)?;
        let mut page = Self::from_html(&path.display().to_string(), &html);

        let sidecar = sidecar_path(path, engine_dir);
        if sidecar.is_file() {
            debug!("Loading engine output from {}", sidecar.display());
            page.engine = EngineOutput::from_file(&sidecar)?;
        }
        Ok(page)
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.source)
    }
}

/// Where the engine output for a saved page is expected
pub fn sidecar_path(path: &Path, engine_dir: Option<&Path>) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sidecar = format!("{}{}", file_name, ENGINE_SIDECAR_SUFFIX);
    match engine_dir {
        Some(dir) => dir.join(sidecar),
        None => path.with_file_name(sidecar),
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ProbeError> {
    Selector::parse(selector)
        .map_err(|e| ProbeError::Script(format!("invalid selector {:?}: {}", selector, e)))
}

fn element_info(el: ElementRef<'_>) -> ElementInfo {
    ElementInfo {
        tag: el.value().name().to_string(),
        html: el.html(),
        text: el.text().collect(),
        id: el.value().id().map(str::to_string),
        href: el.value().attr("href").map(str::to_string),
    }
}

#[async_trait]
impl PageHandle for StaticPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn evaluate(&self) -> Result<EngineOutput, PageError> {
        Ok(self.engine.clone())
    }

    async fn doctype(&self) -> Result<Option<Doctype>, ProbeError> {
        let document = self.document();
        let doctype = document.tree.root().children().find_map(|node| {
            node.value().as_doctype().map(|d| Doctype {
                name: d.name().to_string(),
                public_id: d.public_id().to_string(),
                system_id: d.system_id().to_string(),
            })
        });
        Ok(doctype)
    }

    async fn select(&self, selector: &str) -> Result<Vec<ElementInfo>, ProbeError> {
        let sel = parse_selector(selector)?;
        let document = self.document();
        Ok(document.select(&sel).map(element_info).collect())
    }

    async fn count(&self, selector: &str) -> Result<usize, ProbeError> {
        let sel = parse_selector(selector)?;
        let document = self.document();
        Ok(document.select(&sel).count())
    }

    async fn has_element_id(&self, id: &str) -> Result<bool, ProbeError> {
        if id.is_empty() {
            return Ok(false);
        }
        let sel = parse_selector("[id]")?;
        let document = self.document();
        let found = document.select(&sel).any(|el| el.value().id() == Some(id));
        Ok(found)
    }

    async fn zoom(&self) -> Result<String, ProbeError> {
        Err(ProbeError::Unsupported("zoom"))
    }

    async fn set_zoom(&self, _zoom: &str) -> Result<(), ProbeError> {
        Err(ProbeError::Unsupported("zoom"))
    }

    async fn clipped_text_elements(&self) -> Result<Vec<ElementInfo>, ProbeError> {
        Err(ProbeError::Unsupported("layout"))
    }
}

/// Opens saved HTML files as pages
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    engine_dir: Option<PathBuf>,
}

impl StaticSource {
    pub fn new(engine_dir: Option<PathBuf>) -> Self {
        Self { engine_dir }
    }
}

#[async_trait]
impl PageSource for StaticSource {
    async fn open(&self, page_id: &str) -> Result<Box<dyn PageHandle>, PageError> {
        let page = StaticPage::from_file(Path::new(page_id), self.engine_dir.as_deref())?;
        Ok(Box::new(page))
    }
}
