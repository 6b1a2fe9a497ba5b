// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for rgaabot
//!
//! Read from `rgaabot.toml` when present. Every key has a default, so an
//! absent file or a partial one is fine; command-line flags override it.

use crate::catalog::Catalog;
use crate::error::{CatalogError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "rgaabot.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audit: AuditConfig,
    pub browser: BrowserConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Page identifiers in report order
    pub pages: Vec<String>,
    /// Where the report is written
    pub output: PathBuf,
    /// Report heading
    pub title: String,
    /// Pages evaluated at once
    pub concurrency: usize,
    /// Catalog file replacing the embedded RGAA 4.1 data
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub navigation_timeout_secs: u64,
    /// Extra wait after load so late scripts settle
    pub settle_delay_ms: u64,
    /// axe-core bundle injected into each page
    pub axe_script: PathBuf,
    pub chrome_executable: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rule tags the engine runs
    pub tags: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            output: PathBuf::from("reports/rapport-accessibilite-rgaa.html"),
            title: "Rapport d'accessibilité RGAA".to_string(),
            concurrency: 1,
            catalog: None,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout_secs: 60,
            settle_delay_ms: 2000,
            axe_script: PathBuf::from("node_modules/axe-core/axe.min.js"),
            chrome_executable: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tags: ["wcag2a", "wcag2aa", "wcag21a", "wcag21aa", "best-practice"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Options object passed to `axe.run`
    pub fn run_options(&self) -> serde_json::Value {
        serde_json::json!({
            "runOnly": { "type": "tag", "values": self.tags },
            "resultTypes": ["violations", "passes", "inapplicable", "incomplete"],
        })
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "audit.concurrency",
                message: "must be at least 1".to_string(),
            });
        }
        if self.engine.tags.is_empty() {
            return Err(ConfigError::Invalid {
                key: "engine.tags",
                message: "at least one rule tag is required".to_string(),
            });
        }
        Ok(())
    }

    /// The configured catalog, or the embedded RGAA 4.1 one
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.audit.catalog {
            Some(path) => Catalog::from_file(path),
            None => Catalog::rgaa(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load configuration; a missing file yields the defaults
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&content)
}

pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/rgaabot.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.audit.concurrency, 1);
        assert_eq!(config.engine.tags.len(), 5);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml_str(
            r#"
            [audit]
            pages = ["https://example.org/", "https://example.org/contact"]
            concurrency = 2

            [browser]
            settle_delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.audit.pages.len(), 2);
        assert_eq!(config.audit.concurrency, 2);
        assert_eq!(config.browser.settle_delay_ms, 0);
        assert!(config.browser.headless);
        assert_eq!(config.audit.title, AuditConfig::default().title);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml_str("[audit]\nconcurrency = 0"),
            Err(ConfigError::Invalid { key: "audit.concurrency", .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[engine]\ntags = []"),
            Err(ConfigError::Invalid { key: "engine.tags", .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[audit\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_run_options_shape() {
        let options = EngineConfig::default().run_options();
        assert_eq!(options["runOnly"]["type"], "tag");
        assert_eq!(options["runOnly"]["values"][0], "wcag2a");
        assert_eq!(options["resultTypes"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_default_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        write_default_config(&path).unwrap();
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_catalog_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "[[criterion]]\nid = \"1.1\"\ncategory = \"Images\"\ndescription = \"alt\"\nrule_ids = [\"image-alt\"]\n",
        )
        .unwrap();

        let mut config = Config::default();
        assert_eq!(config.load_catalog().unwrap().len(), 106);
        config.audit.catalog = Some(path);
        assert_eq!(config.load_catalog().unwrap().len(), 1);
    }
}
