// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for rgaabot
//!
//! Only catalog corruption, bad configuration and an unwritable report target
//! abort a run. Page and probe failures are recovered where they happen and
//! surface as warnings plus untested criteria.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RgaaError>;

#[derive(Error, Debug)]
pub enum RgaaError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Page evaluation error: {0}")]
    Page(#[from] PageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed static criterion data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("catalog contains no criteria")]
    Empty,

    #[error("duplicate criterion id {0}")]
    DuplicateId(String),

    #[error("criterion id {0:?} is not a dotted number")]
    InvalidId(String),

    #[error("criterion {0} has no category")]
    MissingCategory(String),

    #[error("criterion {0} has no description")]
    MissingDescription(String),

    #[error("failed to read catalog {path}: {message}")]
    Read { path: PathBuf, message: String },
}

/// Navigation or rule-engine failure for one page.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("rule engine failed: {0}")]
    Engine(String),

    #[error("could not load rule engine script {path}: {source}")]
    EngineScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine output is not valid JSON: {0}")]
    EngineOutput(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one bespoke probe. The probe's criterion keeps whatever state it had.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{0} is not supported by this page handle")]
    Unsupported(&'static str),

    #[error("page script failed: {0}")]
    Script(String),

    #[error("unexpected probe payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Output path unwritable. Evaluation results are unaffected.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
