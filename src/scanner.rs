// SPDX-License-Identifier: PMPL-1.0-or-later
//! Offline scanning of saved HTML pages.
//!
//! Walks directory trees for `.html`/`.htm` files and audits them as static
//! pages. Engine results are replayed from `<file>.axe.json` sidecars.

use crate::catalog::Catalog;
use crate::page::StaticSource;
use crate::probes::Probe;
use crate::runner::{run_batch, BatchOutcome};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// File extensions treated as pages
const SCANNABLE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &[
    "node_modules", ".git", "target", "dist", "_build", "vendor", "coverage",
];

fn is_scannable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SCANNABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand `paths` into page ids. Files are taken as given; directories are
/// walked recursively and their pages listed in path order.
pub fn collect_pages(paths: &[PathBuf]) -> Vec<String> {
    let mut pages = Vec::new();

    for path in paths {
        if !path.is_dir() {
            pages.push(path.display().to_string());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_str().unwrap_or("");
                if e.file_type().is_dir() && e.depth() > 0 {
                    return !SKIP_DIRS.contains(&name) && !name.starts_with('.');
                }
                true
            })
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && is_scannable(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        debug!("{} page(s) under {}", found.len(), path.display());
        pages.extend(found.into_iter().map(|p| p.display().to_string()));
    }

    pages
}

/// Audit saved pages under `paths`
pub async fn scan_paths(
    paths: &[PathBuf],
    engine_dir: Option<PathBuf>,
    catalog: &Catalog,
    probes: &[Box<dyn Probe>],
    concurrency: usize,
) -> BatchOutcome {
    let pages = collect_pages(paths);
    info!("Scanning {} saved page(s)", pages.len());
    let source = StaticSource::new(engine_dir);
    run_batch(&source, &pages, catalog, probes, concurrency).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_pages_walks_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("site/blog")).unwrap();
        std::fs::create_dir_all(root.join("site/node_modules/pkg")).unwrap();
        std::fs::write(root.join("site/index.html"), "").unwrap();
        std::fs::write(root.join("site/blog/post.HTM"), "").unwrap();
        std::fs::write(root.join("site/style.css"), "").unwrap();
        std::fs::write(root.join("site/index.html.axe.json"), "{}").unwrap();
        std::fs::write(root.join("site/node_modules/pkg/readme.html"), "").unwrap();

        let pages = collect_pages(&[root.join("site")]);
        assert_eq!(
            pages,
            vec![
                root.join("site/blog/post.HTM").display().to_string(),
                root.join("site/index.html").display().to_string(),
            ]
        );
    }

    #[test]
    fn test_files_taken_as_given() {
        let pages = collect_pages(&[PathBuf::from("missing.html")]);
        assert_eq!(pages, vec!["missing.html".to_string()]);
    }
}
