// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rgaabot CLI - RGAA 4.1 Accessibility Conformance Bot
//!
//! Part of the gitbot-fleet ecosystem.
//!
//! Exit status: 0 when no criterion is non-conformant, 1 when at least one
//! is, 2 on a fatal error, 3 when no page could be evaluated at all (browser
//! did not start, every page failed).

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rgaabot::aggregate::Verdict;
use rgaabot::catalog::Catalog;
use rgaabot::config::{self, AuditConfig, Config};
use rgaabot::page::BrowserSession;
use rgaabot::probes::{default_probes, probed_criteria};
use rgaabot::report::{render, write_report, OutputFormat, ReportMeta};
use rgaabot::runner::{run_batch, BatchOutcome};
use rgaabot::scanner;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// RGAA 4.1 accessibility conformance bot for gitbot-fleet
#[derive(Parser)]
#[command(name = "rgaabot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit live pages in a headless browser
    Audit {
        /// Page URLs (default: audit.pages from the config file)
        urls: Vec<String>,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Report file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "html")]
        format: FormatArg,

        /// Pages evaluated at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Audit saved HTML files
    Scan {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory holding `<file>.axe.json` engine results
        #[arg(long)]
        engine_results: Option<PathBuf>,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Report file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "html")]
        format: FormatArg,

        /// Pages evaluated at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the RGAA criteria and what covers them
    Criteria {
        /// Only this category
        #[arg(long)]
        category: Option<String>,

        /// Only criteria with an engine rule or a probe
        #[arg(long)]
        automated_only: bool,

        /// Configuration file (for a custom catalog)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Where to write it
        #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Self-contained HTML report
    Html,
    /// Structured JSON
    Json,
    /// Console summary
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("rgaabot=debug")
        } else {
            EnvFilter::new("rgaabot=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Verdict::Conformant) => {}
        Ok(verdict) => std::process::exit(verdict.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Verdict> {
    match cli.command {
        Commands::Audit {
            urls,
            config,
            output,
            format,
            concurrency,
            verbose,
        } => {
            init_logging(verbose);
            let mut config = load_config(config.as_deref())?;
            if !urls.is_empty() {
                config.audit.pages = urls;
            }
            if let Some(n) = concurrency {
                config.audit.concurrency = n;
            }
            config.validate()?;
            if config.audit.pages.is_empty() {
                bail!("no pages to audit: pass URLs or set audit.pages in the config file");
            }

            let catalog = load_catalog(&config)?;
            let probes = default_probes();
            let pages = config.audit.pages.clone();

            let outcome = match BrowserSession::launch(&config.browser, &config.engine).await {
                Ok(session) => {
                    let outcome =
                        run_batch(&session, &pages, &catalog, &probes, config.audit.concurrency)
                            .await;
                    if let Err(e) = session.close().await {
                        warn!("Failed to close browser: {}", e);
                    }
                    outcome
                }
                Err(e) => BatchOutcome::all_failed(&pages, &catalog, &e.to_string()),
            };

            finish(&outcome, &catalog, &config.audit, format.into(), output)
        }

        Commands::Scan {
            paths,
            engine_results,
            config,
            output,
            format,
            concurrency,
            verbose,
        } => {
            init_logging(verbose);
            let mut config = load_config(config.as_deref())?;
            if let Some(n) = concurrency {
                config.audit.concurrency = n;
            }
            config.validate()?;

            let catalog = load_catalog(&config)?;
            let outcome = scanner::scan_paths(
                &paths,
                engine_results,
                &catalog,
                &default_probes(),
                config.audit.concurrency,
            )
            .await;

            finish(&outcome, &catalog, &config.audit, format.into(), output)
        }

        Commands::Criteria {
            category,
            automated_only,
            config,
        } => {
            init_logging(false);
            let config = load_config(config.as_deref())?;
            let catalog = load_catalog(&config)?;
            print_criteria(&catalog, category.as_deref(), automated_only);
            Ok(Verdict::Conformant)
        }

        Commands::Init { path, force } => {
            init_logging(false);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::write_default_config(&path)?;
            eprintln!("Configuration written to {}", path.display());
            Ok(Verdict::Conformant)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);
    config::load_config(&path).with_context(|| format!("loading {}", path.display()))
}

fn load_catalog(config: &Config) -> anyhow::Result<Catalog> {
    config
        .load_catalog()
        .context("loading the criteria catalog")
}

/// Render, write and summarize. HTML always goes to a file; JSON and text
/// go to stdout unless `--output` is given.
fn finish(
    outcome: &BatchOutcome,
    catalog: &Catalog,
    audit: &AuditConfig,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<Verdict> {
    let aggregate = outcome.aggregate(catalog);
    let meta = ReportMeta::new(&audit.title);
    let report = render(&outcome.pages, &outcome.order, catalog, &aggregate, &meta, format)?;

    let destination = match (output, format) {
        (Some(path), _) => Some(path),
        (None, OutputFormat::Html) => Some(audit.output.clone()),
        (None, _) => None,
    };

    match destination {
        Some(path) => {
            write_report(&path, &report)?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", report),
    }

    let stats = &aggregate.stats;
    if outcome.evaluated() < outcome.requested() {
        eprintln!(
            "Warning: only {} of {} page(s) were evaluated",
            outcome.evaluated(),
            outcome.requested()
        );
    }
    eprintln!(
        "{}/{} criteria tested, {}% conformant, {} violation(s)",
        stats.tested, stats.total_criteria, stats.conformity_percentage, stats.total_violations
    );

    let verdict = aggregate.verdict();
    if verdict == Verdict::NotEvaluated {
        eprintln!("Error: no page could be evaluated");
    }
    Ok(verdict)
}

fn print_criteria(catalog: &Catalog, category: Option<&str>, automated_only: bool) {
    let probed = probed_criteria();

    for name in catalog.categories() {
        if category.is_some_and(|c| !c.eq_ignore_ascii_case(name)) {
            continue;
        }

        let mut lines = Vec::new();
        for criterion in catalog.in_category(name) {
            let has_probe = probed.contains(&criterion.id.as_str());
            if automated_only && !criterion.is_automated() && !has_probe {
                continue;
            }

            let mut coverage: Vec<String> = criterion.rule_ids.iter().cloned().collect();
            if has_probe {
                coverage.push("(sonde)".to_string());
            }
            let coverage = if coverage.is_empty() {
                "manuel".to_string()
            } else {
                coverage.join(", ")
            };
            lines.push(format!(
                "  {:<6} {}\n         [{}]",
                criterion.id, criterion.description, coverage
            ));
        }

        if !lines.is_empty() {
            println!("{}", name);
            for line in lines {
                println!("{}", line);
            }
            println!();
        }
    }
}
