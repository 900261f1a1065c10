//! Extraction attempts, cascade states and produced modules.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::OntoGuideError;
use super::seed::SeedTerm;

/// Extraction strategy token understood by the extraction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtractionMethod {
    /// Top-down closure; always yields at least the class hierarchy.
    #[default]
    Top,
    Bot,
    Star,
    Mireot,
}

impl ExtractionMethod {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Bot => "BOT",
            Self::Star => "STAR",
            Self::Mireot => "MIREOT",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ExtractionMethod {
    type Err = OntoGuideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOP" => Ok(Self::Top),
            "BOT" => Ok(Self::Bot),
            "STAR" => Ok(Self::Star),
            "MIREOT" => Ok(Self::Mireot),
            other => Err(OntoGuideError::Config(format!(
                "unknown extraction method: {other}"
            ))),
        }
    }
}

/// How identifiers are handed to the extraction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationShape {
    /// One file, one identifier per line.
    TermFile,
    /// Repeated individual identifier arguments.
    IndividualTerms,
}

impl InvocationShape {
    /// Shapes tried, in order, for one seed set.
    pub const CASCADE: [InvocationShape; 2] = [Self::TermFile, Self::IndividualTerms];
}

/// States of the per-metric extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeState {
    SelectMetric,
    ResolveSeedTerms,
    PrimaryExtraction,
    AlternateExtraction,
    TopLevelClassFallback,
    RootConceptFallback,
    Aborted,
}

impl CascadeState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectMetric => "select_metric",
            Self::ResolveSeedTerms => "resolve_seed_terms",
            Self::PrimaryExtraction => "primary_extraction",
            Self::AlternateExtraction => "alternate_extraction",
            Self::TopLevelClassFallback => "top_level_class_fallback",
            Self::RootConceptFallback => "root_concept_fallback",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CascadeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the seed terms of an attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    /// Seed-term document entries for the metric.
    Resolved,
    /// Synthetic terms from the ontology's top-level classes.
    TopLevelClasses,
    /// The universal root concept alone.
    RootConcept,
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success { module_path: PathBuf },
    Failure { reason: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One step of the cascade for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub state: CascadeState,
    pub method: ExtractionMethod,
    pub shape: InvocationShape,
    pub seed_source: SeedSource,
    pub seed_terms_used: Vec<SeedTerm>,
    pub outcome: AttemptOutcome,
}

/// A successfully extracted sub-ontology. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub source_ontology: PathBuf,
    pub target_metric: String,
    pub extraction_method: ExtractionMethod,
    /// Cascade state that produced the module.
    pub produced_by: CascadeState,
    pub seed_source: SeedSource,
    pub output_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tokens_round_trip_through_from_str() {
        for method in [
            ExtractionMethod::Top,
            ExtractionMethod::Bot,
            ExtractionMethod::Star,
            ExtractionMethod::Mireot,
        ] {
            assert_eq!(method.token().parse::<ExtractionMethod>().unwrap(), method);
        }
        assert_eq!("top".parse::<ExtractionMethod>().unwrap(), ExtractionMethod::Top);
        assert!("SIDEWAYS".parse::<ExtractionMethod>().is_err());
    }

    #[test]
    fn test_default_method_is_top() {
        assert_eq!(ExtractionMethod::default(), ExtractionMethod::Top);
    }

    #[test]
    fn test_shape_cascade_order() {
        assert_eq!(
            InvocationShape::CASCADE,
            [InvocationShape::TermFile, InvocationShape::IndividualTerms]
        );
    }

    #[test]
    fn test_attempt_outcome_serializes_tagged() {
        let outcome = AttemptOutcome::Failure {
            reason: "missing output".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert!(!outcome.is_success());
    }
}
