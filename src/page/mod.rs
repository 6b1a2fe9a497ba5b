// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page handles: the queryable rendered DOM the engine and probes run against.
//!
//! Two implementations exist. [`browser::BrowserPage`] drives a live
//! Chromium tab; [`static_page::StaticPage`] parses saved HTML and replays a
//! recorded engine result. Static pages have no layout, so zoom queries
//! return [`ProbeError::Unsupported`].

pub mod browser;
pub mod static_page;

use crate::error::{PageError, ProbeError};
use crate::finding::EngineOutput;
use async_trait::async_trait;
use serde::Deserialize;

pub use browser::{BrowserPage, BrowserSession};
pub use static_page::{StaticPage, StaticSource};

/// Document type declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctype {
    pub name: String,
    #[serde(default)]
    pub public_id: String,
    #[serde(default)]
    pub system_id: String,
}

impl Doctype {
    pub fn html5() -> Self {
        Self {
            name: "html".to_string(),
            public_id: String::new(),
            system_id: String::new(),
        }
    }

    /// Serialized declaration, e.g. `<!DOCTYPE html>`
    pub fn declaration(&self) -> String {
        match (self.public_id.is_empty(), self.system_id.is_empty()) {
            (true, true) => format!("<!DOCTYPE {}>", self.name),
            (false, _) => format!(
                "<!DOCTYPE {} PUBLIC \"{}\" \"{}\">",
                self.name, self.public_id, self.system_id
            ),
            (true, false) => format!("<!DOCTYPE {} SYSTEM \"{}\">", self.name, self.system_id),
        }
    }
}

/// Snapshot of one element returned by a query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,
    /// Outer HTML
    pub html: String,
    /// Text content, untrimmed
    pub text: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// A loaded page. Queries take CSS selectors and follow `querySelectorAll`
/// semantics (document order).
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Page identifier (URL or file path)
    fn id(&self) -> &str;

    /// Run the rule engine against the current DOM
    async fn evaluate(&self) -> Result<EngineOutput, PageError>;

    async fn doctype(&self) -> Result<Option<Doctype>, ProbeError>;

    async fn select(&self, selector: &str) -> Result<Vec<ElementInfo>, ProbeError>;

    async fn count(&self, selector: &str) -> Result<usize, ProbeError>;

    /// Whether an element with this exact id exists
    async fn has_element_id(&self, id: &str) -> Result<bool, ProbeError>;

    /// Current body zoom value as the page reports it (often empty)
    async fn zoom(&self) -> Result<String, ProbeError>;

    async fn set_zoom(&self, zoom: &str) -> Result<(), ProbeError>;

    /// Text elements whose content is clipped by `overflow: hidden` at the current zoom
    async fn clipped_text_elements(&self) -> Result<Vec<ElementInfo>, ProbeError>;

    /// Release the page
    async fn close(&self) -> Result<(), PageError> {
        Ok(())
    }
}

/// Opens page handles by identifier
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn open(&self, page_id: &str) -> Result<Box<dyn PageHandle>, PageError>;
}
