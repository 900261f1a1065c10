//! Quality-driven ontology module selection.
//!
//! Scored ontology metrics are checked against a catalog of worst ranges,
//! the most severe metrics (with their ties) are selected, and a module is
//! extracted for each through a fallback cascade over an external
//! extraction tool.
//!
//! ```text
//! catalog ─► ThresholdRuleTable ─┐
//! scores ───────────────────────►├─► WorstMetricClassifier ─► TieBreakResolver
//!                                │                                   │
//! seed terms ─► SeedTermResolver ┴──► ModuleExtractionOrchestrator ◄─┘
//!                                              │
//!                                      ExtractionTool (ROBOT)
//! ```

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod descriptions;
pub mod domain;
pub mod iri;
pub mod orchestrator;
pub mod parallel;
pub mod reporting;
pub mod seed_terms;
pub mod summary;
pub mod telemetry;
pub mod tie_break;
pub mod tooling;

pub use catalog::{CatalogRow, ThresholdRuleTable, DEFAULT_METRIC_SUFFIX};
pub use classifier::{ClassificationReport, SeverityPolicy, WorstMetricClassifier};
pub use config::OntoGuideConfig;
pub use descriptions::{MetricDescriptions, NO_DESCRIPTION};
pub use domain::{
    AttemptOutcome, CascadeState, ClassifiedMetric, ComparisonRule, ExtractionAttempt,
    ExtractionMethod, InvocationShape, MetricDefinition, Module, OntoGuideError, Result,
    ScoredMetric, ScoredMetricsDocument, SeedSource, SeedTerm, SeedTermDocument, SeedTermEntry,
    ToolInvocationFailure,
};
pub use iri::{is_valid_iri, normalize_iri, OWL_THING};
pub use orchestrator::{
    ExtractionSettings, MetricOutcome, MetricResult, ModuleExtractionOrchestrator,
};
pub use parallel::{extract_tie_group, run_modularization};
pub use reporting::{
    read_modularization_report, write_modularization_report, ModularizationReport,
};
pub use seed_terms::{MatchKind, ResolvedSeedTerms, SeedTermResolver};
pub use summary::MetricsSummary;
pub use telemetry::init_tracing;
pub use tie_break::{TieBreakResolver, TieGroup};
pub use tooling::{ExtractionRequest, ExtractionTool, ToolReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
