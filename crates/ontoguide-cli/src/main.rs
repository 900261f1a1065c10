//! Ontoguide CLI
//!
//! The `ontoguide` command classifies scored ontology metrics and extracts
//! focused modules for the worst ones.
//!
//! ## Commands
//!
//! - `classify`: List worst metrics in severity order
//! - `summarize`: Print the reporting summary as JSON
//! - `normalize-iri`: Repair and validate concept identifiers
//! - `extract`: Extract a module per selected worst metric through ROBOT
//! - `report`: Show a stored modularization report
//! - `config`: Print the effective configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use ontoguide_core::{
    normalize_iri, read_modularization_report, run_modularization, write_modularization_report,
    ClassificationReport, ExtractionMethod, MetricDescriptions, MetricResult, MetricsSummary,
    ModuleExtractionOrchestrator, OntoGuideConfig, ScoredMetricsDocument, SeedTermDocument,
    ThresholdRuleTable, WorstMetricClassifier,
};
use ontoguide_robot::RobotTool;

#[derive(Parser)]
#[command(name = "ontoguide")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Quality-driven ontology module selection", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "ONTOGUIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Metric catalog CSV (overrides the configured path)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Metric descriptions CSV (overrides the configured path)
    #[arg(long, global = true)]
    descriptions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List worst metrics in severity order
    Classify {
        /// Scored metrics document (JSON)
        metrics: PathBuf,

        /// Selection window for the tie group
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Print worst, best and overall metrics as JSON
    Summarize {
        /// Scored metrics document (JSON)
        metrics: PathBuf,

        /// Seed-term document (JSON), for seed labels per worst metric
        #[arg(short, long)]
        seed_terms: Option<PathBuf>,
    },

    /// Repair and validate concept identifiers
    NormalizeIri {
        /// Raw identifiers such as `obo:GO_0008150`
        #[arg(required = true)]
        iris: Vec<String>,
    },

    /// Extract a module for each selected worst metric
    Extract {
        /// Source ontology
        ontology: PathBuf,

        /// Scored metrics document (JSON)
        metrics: PathBuf,

        /// Seed-term document (JSON)
        seed_terms: PathBuf,

        /// Directory for extracted modules
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Extraction method (TOP, BOT, STAR, MIREOT)
        #[arg(short, long)]
        method: Option<ExtractionMethod>,

        /// ROBOT executable
        #[arg(long)]
        robot: Option<String>,

        /// Maximum concurrent extractions
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Overall deadline in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Index of the metric to select within the window (0 = worst)
        #[arg(long, default_value = "0")]
        select: usize,

        /// Skip writing the modularization report
        #[arg(long)]
        no_report: bool,
    },

    /// Show a stored modularization report after verifying its digest
    Report {
        /// Run ID
        run_id: String,

        /// Report directory (default: configured report_dir)
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ontoguide_core::init_tracing(cli.json, level);

    let mut config = OntoGuideConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(catalog) = cli.catalog {
        config.paths.catalog = catalog;
    }
    if let Some(descriptions) = cli.descriptions {
        config.paths.descriptions = descriptions;
    }

    match cli.command {
        Commands::Classify { metrics, top_n } => cmd_classify(&config, &metrics, top_n),
        Commands::Summarize {
            metrics,
            seed_terms,
        } => cmd_summarize(&config, &metrics, seed_terms.as_deref()),
        Commands::NormalizeIri { iris } => cmd_normalize_iri(&iris),
        Commands::Extract {
            ontology,
            metrics,
            seed_terms,
            output_dir,
            method,
            robot,
            max_concurrent,
            deadline_secs,
            select,
            no_report,
        } => {
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            if let Some(method) = method {
                config.extraction.method = method;
            }
            if let Some(robot) = robot {
                config.extraction.robot_bin = robot;
            }
            if let Some(n) = max_concurrent {
                config.concurrency.max_concurrent = n;
            }
            if deadline_secs.is_some() {
                config.concurrency.deadline_secs = deadline_secs;
            }
            config.validate().context("Invalid extraction options")?;
            cmd_extract(&config, &ontology, &metrics, &seed_terms, select, !no_report).await
        }
        Commands::Report { run_id, report_dir } => {
            let dir = report_dir.unwrap_or_else(|| config.paths.report_dir.clone());
            cmd_report(&run_id, &dir)
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_catalog(config: &OntoGuideConfig) -> Result<ThresholdRuleTable> {
    let path = &config.paths.catalog;
    ThresholdRuleTable::from_csv_path(path, &config.selection.suffix)
        .with_context(|| format!("Failed to read metric catalog: {}", path.display()))
}

fn load_descriptions(config: &OntoGuideConfig) -> MetricDescriptions {
    MetricDescriptions::load_or_empty(&config.paths.descriptions, &config.selection.suffix)
}

/// First `max` characters of `text`, marked when cut.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn load_metrics(config: &OntoGuideConfig, path: &Path) -> Result<ScoredMetricsDocument> {
    ScoredMetricsDocument::from_path_with_reserved(path, &config.selection.reserved_keys)
        .with_context(|| format!("Failed to read scored metrics: {}", path.display()))
}

fn load_seed_terms(path: &Path) -> Result<SeedTermDocument> {
    SeedTermDocument::from_path(path)
        .with_context(|| format!("Failed to read seed terms: {}", path.display()))
}

fn classify(
    config: &OntoGuideConfig,
    table: &ThresholdRuleTable,
    document: &ScoredMetricsDocument,
) -> ClassificationReport {
    let policy = config.severity_policy();
    WorstMetricClassifier::new(table, &policy, &config.selection.reserved_keys)
        .classify(&document.metrics)
}

/// Print worst metrics and the tie group selected for extraction.
fn cmd_classify(config: &OntoGuideConfig, metrics: &Path, top_n: Option<usize>) -> Result<()> {
    let table = load_catalog(config)?;
    let document = load_metrics(config, metrics)?;
    let descriptions = load_descriptions(config);
    let report = classify(config, &table, &document);

    if report.worst.is_empty() {
        println!("No metrics in their worst range.");
    }
    for metric in &report.worst {
        println!(
            "{:>3}. {:<20} {:>10.4}   {}",
            metric.severity_rank.map_or(0, |r| r + 1),
            metric.name,
            metric.value,
            table.range_info(&metric.name)
        );
        println!(
            "     {}",
            truncate_chars(&descriptions.describe(&metric.name), 100)
        );
    }
    if !report.unmatched.is_empty() {
        println!("Not in catalog: {}", report.unmatched.join(", "));
    }

    let mut selector = config.module_selector();
    if let Some(n) = top_n {
        selector = selector.with_top_n(n.max(1));
    }
    if let Some(group) = selector.select(&report) {
        let label = if group.from_fallback {
            "Lowest scoring"
        } else {
            "Selected"
        };
        println!("{label}: {}", group.names().join(", "));
    }
    Ok(())
}

fn cmd_summarize(config: &OntoGuideConfig, metrics: &Path, seed_terms: Option<&Path>) -> Result<()> {
    let table = load_catalog(config)?;
    let document = load_metrics(config, metrics)?;
    let seeds = seed_terms.map(load_seed_terms).transpose()?;
    let descriptions = load_descriptions(config);
    let report = classify(config, &table, &document);

    let summary = MetricsSummary::build(
        &document,
        &report,
        &table,
        &descriptions,
        seeds.as_ref(),
        config.selection.report_window,
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_normalize_iri(iris: &[String]) -> Result<()> {
    for raw in iris {
        let iri = normalize_iri(raw);
        let status = if ontoguide_core::is_valid_iri(&iri) {
            "valid"
        } else {
            "invalid"
        };
        println!("{raw} -> {iri} ({status})");
    }
    Ok(())
}

async fn cmd_extract(
    config: &OntoGuideConfig,
    ontology: &Path,
    metrics: &Path,
    seed_terms: &Path,
    select: usize,
    write_report: bool,
) -> Result<()> {
    if !ontology.exists() {
        anyhow::bail!("Ontology not found: {}", ontology.display());
    }
    let table = load_catalog(config)?;
    let document = load_metrics(config, metrics)?;
    let seeds = load_seed_terms(seed_terms)?;
    let classification = classify(config, &table, &document);

    let tool = RobotTool::new(config.extraction.robot_bin.clone())
        .with_timeout(Duration::from_secs(config.extraction.tool_timeout_secs));
    let orchestrator = ModuleExtractionOrchestrator::new(
        Arc::new(tool),
        Arc::new(seeds),
        config.extraction_settings(),
    );
    let selector = config.module_selector().with_selection_index(select);

    let report = run_modularization(&orchestrator, ontology, &classification, &selector).await;

    for outcome in &report.outcomes {
        match &outcome.result {
            MetricResult::Extracted(module) => {
                println!("{}: {}", outcome.metric, module.output_path.display())
            }
            MetricResult::Aborted { reason } => {
                eprintln!("{}: no module ({reason})", outcome.metric)
            }
        }
    }

    if write_report {
        let path = write_modularization_report(&report, &config.paths.report_dir)
            .context("Failed to write modularization report")?;
        info!(run_id = %report.run_id, path = %path.display(), "Report written");
    }

    if !report.has_modules() {
        anyhow::bail!("No modules were created for {}", ontology.display());
    }
    println!("Created {} module(s)", report.modules().len());
    Ok(())
}

fn cmd_report(run_id: &str, dir: &Path) -> Result<()> {
    let report = read_modularization_report(run_id, dir)
        .with_context(|| format!("Failed to read report {run_id} from {}", dir.display()))?;

    println!("Run {} on {}", report.run_id, report.ontology.display());
    for outcome in &report.outcomes {
        let states: Vec<&str> = outcome.states_visited.iter().map(|s| s.name()).collect();
        let result = match &outcome.result {
            MetricResult::Extracted(module) => module.output_path.display().to_string(),
            MetricResult::Aborted { reason } => format!("aborted: {reason}"),
        };
        println!("  {}: {} [{}]", outcome.metric, result, states.join(" -> "));
    }
    println!("Report digest verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("äöüß", 2), "äö...");
    }
}
