//! Domain model for quality-driven module selection.

pub mod error;
pub mod metric;
pub mod module;
pub mod seed;

pub use error::{OntoGuideError, Result, ToolInvocationFailure};
pub use metric::{
    ClassifiedMetric, ComparisonRule, MetricDefinition, ScoredMetric, ScoredMetricsDocument,
    DEFAULT_RESERVED_KEYS,
};
pub use module::{
    AttemptOutcome, CascadeState, ExtractionAttempt, ExtractionMethod, InvocationShape, Module,
    SeedSource,
};
pub use seed::{SeedTerm, SeedTermDocument, SeedTermEntry};
