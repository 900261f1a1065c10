//! Per-metric module extraction cascade.
//!
//! For every selected metric the orchestrator walks a fixed sequence of
//! states, entering each only when the previous one failed:
//!
//! 1. select the metric (tie group member)
//! 2. resolve seed terms; with no valid identifiers jump to 4
//! 3. primary extraction (term file), then alternate (individual terms)
//! 4. top-level class fallback, re-entering 3 with the discovered classes
//! 5. root-concept fallback (`owl:Thing`, `TOP`)
//! 6. aborted
//!
//! Every state runs at most once, so the cascade always terminates. No
//! failure escapes as an error: each is recorded as an [`ExtractionAttempt`]
//! and the metric ends as either a [`Module`] or [`MetricResult::Aborted`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    AttemptOutcome, CascadeState, ExtractionAttempt, ExtractionMethod, InvocationShape, Module,
    OntoGuideError, SeedSource, SeedTerm, SeedTermDocument, ToolInvocationFailure,
};
use crate::iri::{is_valid_iri, local_name, OWL_THING};
use crate::reporting::sha256_hex;
use crate::seed_terms::SeedTermResolver;
use crate::tooling::{ExtractionRequest, ExtractionTool, ToolReport};

/// Marker stripped from ontology stems when naming modules.
pub const CONVERTED_MARKER: &str = "_converted";

/// Default cap on synthetic seeds from the top-level class query.
pub const DEFAULT_TOP_LEVEL_LIMIT: usize = 10;

/// Knobs for one orchestrator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    pub method: ExtractionMethod,
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub top_level_limit: usize,
    /// Catalog suffix used when toggling seed-term keys.
    pub suffix: String,
    pub max_concurrent: usize,
    /// Budget for a whole request, measured from its start.
    pub deadline: Option<Duration>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            method: ExtractionMethod::Top,
            output_dir: PathBuf::from("modules"),
            scratch_dir: std::env::temp_dir().join("ontoguide"),
            top_level_limit: DEFAULT_TOP_LEVEL_LIMIT,
            suffix: crate::catalog::DEFAULT_METRIC_SUFFIX.to_string(),
            max_concurrent: 4,
            deadline: None,
        }
    }
}

/// Terminal result for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MetricResult {
    Extracted(Module),
    Aborted { reason: String },
}

/// Everything the cascade did for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOutcome {
    pub metric: String,
    pub states_visited: Vec<CascadeState>,
    pub attempts: Vec<ExtractionAttempt>,
    pub result: MetricResult,
}

impl MetricOutcome {
    pub fn module(&self) -> Option<&Module> {
        match &self.result {
            MetricResult::Extracted(module) => Some(module),
            MetricResult::Aborted { .. } => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.result, MetricResult::Aborted { .. })
    }

    /// The extracted module, or [`OntoGuideError::ExhaustedCascade`].
    pub fn into_module(self) -> Result<Module, OntoGuideError> {
        match self.result {
            MetricResult::Extracted(module) => Ok(module),
            MetricResult::Aborted { reason } => Err(OntoGuideError::ExhaustedCascade {
                metric: self.metric,
                reason,
            }),
        }
    }
}

/// `pizza_converted.owl` -> `pizza`.
pub fn ontology_base_name(ontology: &Path) -> String {
    let stem = ontology
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ontology".to_string());
    stem.replace(CONVERTED_MARKER, "")
}

/// Output path for a metric's module. Distinct per metric so concurrent
/// workers never share a file: a name that needs character replacement also
/// carries a short digest of the raw name, so `AN.Onto` and `AN_Onto` differ.
pub fn module_output_path(output_dir: &Path, ontology: &Path, metric: &str) -> PathBuf {
    let mut safe: String = metric
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if safe != metric {
        safe.push('_');
        safe.push_str(&sha256_hex(metric.as_bytes())[..8]);
    }
    output_dir.join(format!("{}_{safe}_module.owl", ontology_base_name(ontology)))
}

/// Run `fut` unless the deadline has already passed or passes first.
async fn within_deadline<T, F>(deadline: Option<Instant>, fut: F) -> Result<T, ToolInvocationFailure>
where
    F: Future<Output = Result<T, ToolInvocationFailure>>,
{
    match deadline {
        Some(at) if Instant::now() >= at => Err(ToolInvocationFailure::DeadlineExceeded),
        Some(at) => tokio::time::timeout_at(at, fut)
            .await
            .unwrap_or(Err(ToolInvocationFailure::DeadlineExceeded)),
        None => fut.await,
    }
}

/// Success needs a clean exit AND a non-empty output file.
async fn verify_output(report: ToolReport, output: &Path) -> Result<(), ToolInvocationFailure> {
    if !report.succeeded() {
        return Err(ToolInvocationFailure::NonZeroExit {
            code: report.exit_code,
            stderr: report.stderr,
        });
    }
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(ToolInvocationFailure::EmptyOutput {
            path: output.to_path_buf(),
        }),
        Err(_) => Err(ToolInvocationFailure::MissingOutput {
            path: output.to_path_buf(),
        }),
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptPlan {
    state: CascadeState,
    shape: InvocationShape,
    method: ExtractionMethod,
    source: SeedSource,
}

/// Mutable record of one metric's walk through the cascade.
struct CascadeRun {
    metric: String,
    states_visited: Vec<CascadeState>,
    attempts: Vec<ExtractionAttempt>,
}

impl CascadeRun {
    fn new(metric: &str) -> Self {
        Self {
            metric: metric.to_string(),
            states_visited: Vec::new(),
            attempts: Vec::new(),
        }
    }

    fn enter(&mut self, state: CascadeState) {
        info!(metric = %self.metric, state = %state, "Entering cascade state");
        self.states_visited.push(state);
    }

    fn extracted(self, module: Module) -> MetricOutcome {
        info!(
            metric = %self.metric,
            path = %module.output_path.display(),
            produced_by = %module.produced_by,
            "Module extracted"
        );
        MetricOutcome {
            metric: self.metric,
            states_visited: self.states_visited,
            attempts: self.attempts,
            result: MetricResult::Extracted(module),
        }
    }

    fn aborted(mut self, reason: String) -> MetricOutcome {
        self.enter(CascadeState::Aborted);
        warn!(metric = %self.metric, reason = %reason, "Extraction cascade exhausted");
        MetricOutcome {
            metric: self.metric,
            states_visited: self.states_visited,
            attempts: self.attempts,
            result: MetricResult::Aborted { reason },
        }
    }
}

/// Drives the extraction tool through the fallback cascade.
///
/// Cheap to clone; workers share the tool and seed-term document.
#[derive(Clone)]
pub struct ModuleExtractionOrchestrator {
    tool: Arc<dyn ExtractionTool>,
    seeds: Arc<SeedTermDocument>,
    settings: ExtractionSettings,
}

impl std::fmt::Debug for ModuleExtractionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleExtractionOrchestrator")
            .field("seed_keys", &self.seeds.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ModuleExtractionOrchestrator {
    pub fn new(
        tool: Arc<dyn ExtractionTool>,
        seeds: Arc<SeedTermDocument>,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            tool,
            seeds,
            settings,
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Deadline for a request starting now, if one is configured.
    pub fn request_deadline(&self) -> Option<Instant> {
        self.settings.deadline.map(|d| Instant::now() + d)
    }

    /// Run the cascade for a single metric.
    #[instrument(skip(self, ontology, deadline), fields(ontology = %ontology.display()))]
    pub async fn extract_metric(
        &self,
        ontology: &Path,
        metric: &str,
        deadline: Option<Instant>,
    ) -> MetricOutcome {
        let mut run = CascadeRun::new(metric);
        let output = module_output_path(&self.settings.output_dir, ontology, metric);
        run.enter(CascadeState::SelectMetric);

        run.enter(CascadeState::ResolveSeedTerms);
        let resolved = SeedTermResolver::new(&self.seeds, &self.settings.suffix).resolve(metric);
        let mut seeds = resolved.valid_terms();
        let mut source = SeedSource::Resolved;

        if seeds.is_empty() {
            info!(metric, "No valid seed terms; querying top-level classes");
            run.enter(CascadeState::TopLevelClassFallback);
            match self.top_level_seeds(ontology, deadline).await {
                Ok(classes) if !classes.is_empty() => {
                    seeds = classes;
                    source = SeedSource::TopLevelClasses;
                }
                Ok(_) => warn!(metric, "Ontology has no top-level classes"),
                Err(failure) if failure.is_deadline() => {
                    return run.aborted(failure.to_string());
                }
                Err(failure) => warn!(metric, error = %failure, "Top-level class query failed"),
            }
        }

        if !seeds.is_empty() {
            let states = [
                CascadeState::PrimaryExtraction,
                CascadeState::AlternateExtraction,
            ];
            for (state, shape) in states.into_iter().zip(InvocationShape::CASCADE) {
                run.enter(state);
                let plan = AttemptPlan {
                    state,
                    shape,
                    method: self.settings.method,
                    source,
                };
                let (record, result) = self
                    .attempt(ontology, metric, &output, plan, &seeds, deadline)
                    .await;
                run.attempts.push(record);
                match result {
                    Ok(module) => return run.extracted(module),
                    Err(failure) if failure.is_deadline() => {
                        return run.aborted(failure.to_string());
                    }
                    Err(_) => {}
                }
            }
        }

        run.enter(CascadeState::RootConceptFallback);
        let root = vec![SeedTerm::trusted(local_name(OWL_THING), OWL_THING)];
        let plan = AttemptPlan {
            state: CascadeState::RootConceptFallback,
            shape: InvocationShape::TermFile,
            method: ExtractionMethod::Top,
            source: SeedSource::RootConcept,
        };
        let (record, result) = self
            .attempt(ontology, metric, &output, plan, &root, deadline)
            .await;
        run.attempts.push(record);
        match result {
            Ok(module) => run.extracted(module),
            Err(failure) => run.aborted(format!("root concept extraction failed: {failure}")),
        }
    }

    /// Synthetic seed terms from the ontology's top-level classes.
    async fn top_level_seeds(
        &self,
        ontology: &Path,
        deadline: Option<Instant>,
    ) -> Result<Vec<SeedTerm>, ToolInvocationFailure> {
        let limit = self.settings.top_level_limit;
        let iris = within_deadline(
            deadline,
            self.tool
                .top_level_classes(ontology, limit, &self.settings.scratch_dir),
        )
        .await?;

        let seeds: Vec<SeedTerm> = iris
            .iter()
            .map(|iri| iri.trim())
            .filter(|iri| is_valid_iri(iri))
            .take(limit)
            .map(|iri| SeedTerm::trusted(local_name(iri), iri))
            .collect();
        debug!(found = iris.len(), kept = seeds.len(), "Top-level classes");
        Ok(seeds)
    }

    /// One tool invocation, recorded whether it succeeds or not.
    async fn attempt(
        &self,
        ontology: &Path,
        metric: &str,
        output: &Path,
        plan: AttemptPlan,
        seeds: &[SeedTerm],
        deadline: Option<Instant>,
    ) -> (ExtractionAttempt, Result<Module, ToolInvocationFailure>) {
        // A stale file from an earlier run must not pass the output check.
        if let Err(e) = tokio::fs::remove_file(output).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %output.display(), error = %e, "Could not remove stale module");
            }
        }

        let request = ExtractionRequest {
            input: ontology.to_path_buf(),
            method: plan.method,
            shape: plan.shape,
            identifiers: seeds
                .iter()
                .filter_map(|s| s.usable_iri().map(str::to_string))
                .collect(),
            output: output.to_path_buf(),
            scratch_dir: self.settings.scratch_dir.clone(),
            invocation_id: Uuid::new_v4(),
        };
        debug!(
            state = %plan.state,
            shape = ?plan.shape,
            identifiers = request.identifiers.len(),
            "Invoking extraction tool"
        );

        let result = match within_deadline(deadline, self.tool.extract(&request)).await {
            Ok(report) => verify_output(report, output).await,
            Err(failure) => Err(failure),
        };

        let outcome = match &result {
            Ok(()) => AttemptOutcome::Success {
                module_path: output.to_path_buf(),
            },
            Err(failure) => {
                warn!(metric, state = %plan.state, error = %failure, "Extraction attempt failed");
                AttemptOutcome::Failure {
                    reason: failure.to_string(),
                }
            }
        };
        let record = ExtractionAttempt {
            state: plan.state,
            method: plan.method,
            shape: plan.shape,
            seed_source: plan.source,
            seed_terms_used: seeds.to_vec(),
            outcome,
        };

        let module = result.map(|()| Module {
            source_ontology: ontology.to_path_buf(),
            target_metric: metric.to_string(),
            extraction_method: plan.method,
            produced_by: plan.state,
            seed_source: plan.source,
            output_path: output.to_path_buf(),
        });
        (record, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_converted_marker() {
        assert_eq!(ontology_base_name(Path::new("/data/pizza_converted.owl")), "pizza");
        assert_eq!(ontology_base_name(Path::new("go.owl")), "go");
    }

    #[test]
    fn test_output_path_is_distinct_per_metric() {
        let dir = Path::new("/out");
        let onto = Path::new("/data/pizza_converted.owl");
        let a = module_output_path(dir, onto, "ANOnto");
        let b = module_output_path(dir, onto, "AROnto");
        assert_eq!(a, PathBuf::from("/out/pizza_ANOnto_module.owl"));
        assert_ne!(a, b);
        assert_eq!(
            module_output_path(dir, onto, "a/b c"),
            PathBuf::from(format!(
                "/out/pizza_a_b_c_{}_module.owl",
                &sha256_hex(b"a/b c")[..8]
            ))
        );
    }

    #[test]
    fn test_replaced_characters_do_not_collide() {
        let dir = Path::new("/out");
        let onto = Path::new("pizza.owl");
        let dotted = module_output_path(dir, onto, "AN.Onto");
        let underscored = module_output_path(dir, onto, "AN_Onto");
        assert_eq!(underscored, PathBuf::from("/out/pizza_AN_Onto_module.owl"));
        assert_ne!(dotted, underscored);
        assert_ne!(dotted, module_output_path(dir, onto, "AN Onto"));
    }

    #[tokio::test]
    async fn test_expired_deadline_short_circuits() {
        let past = Instant::now() - Duration::from_millis(1);
        let result: Result<(), _> = within_deadline(Some(past), async { Ok(()) }).await;
        assert_eq!(result, Err(ToolInvocationFailure::DeadlineExceeded));

        let result: Result<u8, _> = within_deadline(None, async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_verify_output_requires_non_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.owl");
        let ok = ToolReport::default();

        assert!(matches!(
            verify_output(ok.clone(), &path).await,
            Err(ToolInvocationFailure::MissingOutput { .. })
        ));

        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            verify_output(ok.clone(), &path).await,
            Err(ToolInvocationFailure::EmptyOutput { .. })
        ));

        std::fs::write(&path, b"<rdf/>").unwrap();
        assert!(verify_output(ok, &path).await.is_ok());

        let failed = ToolReport {
            exit_code: 1,
            stderr: "boom".to_string(),
        };
        assert!(matches!(
            verify_output(failed, &path).await,
            Err(ToolInvocationFailure::NonZeroExit { code: 1, .. })
        ));
    }
}
