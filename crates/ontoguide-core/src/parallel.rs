//! Bounded parallel extraction over a tie group.
//!
//! Members of a tie group share nothing mutable: each worker runs its own
//! cascade and writes its own output path. A semaphore caps the number of
//! concurrent tool processes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::classifier::ClassificationReport;
use crate::domain::CascadeState;
use crate::orchestrator::{MetricOutcome, MetricResult, ModuleExtractionOrchestrator};
use crate::reporting::ModularizationReport;
use crate::tie_break::{TieBreakResolver, TieGroup};

/// Run the cascade for every member of `group`, at most `max_concurrent`
/// at a time. Outcomes come back in group order.
#[instrument(skip(orchestrator, group, deadline), fields(members = group.len()))]
pub async fn extract_tie_group(
    orchestrator: &ModuleExtractionOrchestrator,
    ontology: &Path,
    group: &TieGroup,
    deadline: Option<Instant>,
) -> Vec<MetricOutcome> {
    let max_concurrent = orchestrator.settings().max_concurrent.max(1);
    let sem = Arc::new(Semaphore::new(max_concurrent));
    let ontology: PathBuf = ontology.to_path_buf();

    let mut tasks = Vec::with_capacity(group.len());
    for member in &group.members {
        let orchestrator = orchestrator.clone();
        let ontology = ontology.clone();
        let metric = member.name.clone();
        let sem = Arc::clone(&sem);

        let task = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            orchestrator.extract_metric(&ontology, &metric, deadline).await
        });
        tasks.push((member.name.clone(), task));
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (metric, task) in tasks {
        match task.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!(metric = %metric, error = %e, "Extraction worker did not finish");
                outcomes.push(MetricOutcome {
                    metric,
                    states_visited: vec![CascadeState::Aborted],
                    attempts: Vec::new(),
                    result: MetricResult::Aborted {
                        reason: format!("worker failed: {e}"),
                    },
                });
            }
        }
    }
    outcomes
}

/// Select the metrics to modularize and extract a module for each.
///
/// With no worst metrics the selection degrades to the lowest-scoring ones;
/// with no scored metrics at all the report is empty.
#[instrument(skip(orchestrator, ontology, classification, selector), fields(ontology = %ontology.display()))]
pub async fn run_modularization(
    orchestrator: &ModuleExtractionOrchestrator,
    ontology: &Path,
    classification: &ClassificationReport,
    selector: &TieBreakResolver,
) -> ModularizationReport {
    let started_at = Utc::now();
    let deadline = orchestrator.request_deadline();
    let run_id = Uuid::new_v4().to_string();

    let selection = selector.select(classification);
    let outcomes = match &selection {
        Some(group) => {
            info!(run_id = %run_id, metrics = ?group.names(), "Extracting modules");
            extract_tie_group(orchestrator, ontology, group, deadline).await
        }
        None => {
            warn!(run_id = %run_id, "No metrics available to select");
            Vec::new()
        }
    };

    let report = ModularizationReport {
        run_id,
        ontology: ontology.to_path_buf(),
        selection,
        outcomes,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        modules = report.modules().len(),
        aborted = report.failures().len(),
        "Modularization finished"
    );
    report
}
