//! Modularization report artifact.
//!
//! A run is persisted as `<dir>/<run_id>/modularization.json` next to a
//! `modularization.digest` holding the SHA-256 of the JSON bytes. Reading
//! verifies the digest before deserializing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{Module, OntoGuideError, Result};
use crate::orchestrator::MetricOutcome;
use crate::tie_break::TieGroup;

const REPORT_FILE: &str = "modularization.json";
const DIGEST_FILE: &str = "modularization.digest";

/// Outcome of one modularization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModularizationReport {
    pub run_id: String,
    pub ontology: PathBuf,
    /// Metrics chosen for extraction; `None` when nothing was scored.
    pub selection: Option<TieGroup>,
    pub outcomes: Vec<MetricOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ModularizationReport {
    pub fn modules(&self) -> Vec<&Module> {
        self.outcomes.iter().filter_map(MetricOutcome::module).collect()
    }

    /// Metrics whose cascade ended aborted.
    pub fn failures(&self) -> Vec<&MetricOutcome> {
        self.outcomes.iter().filter(|o| o.is_aborted()).collect()
    }

    pub fn has_modules(&self) -> bool {
        self.outcomes.iter().any(|o| o.module().is_some())
    }
}

/// Hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Persist the report and its digest; returns the JSON path.
pub fn write_modularization_report(report: &ModularizationReport, dir: &Path) -> Result<PathBuf> {
    let run_dir = dir.join(&report.run_id);
    std::fs::create_dir_all(&run_dir)?;

    let path = run_dir.join(REPORT_FILE);
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(&path, &json)?;
    std::fs::write(run_dir.join(DIGEST_FILE), sha256_hex(&json).as_bytes())?;

    Ok(path)
}

/// Read `<dir>/<run_id>/modularization.json`, verifying its digest.
pub fn read_modularization_report(run_id: &str, dir: &Path) -> Result<ModularizationReport> {
    let run_dir = dir.join(run_id);
    let json = std::fs::read(run_dir.join(REPORT_FILE))?;
    let expected = std::fs::read_to_string(run_dir.join(DIGEST_FILE))?;

    let actual = sha256_hex(&json);
    if expected.trim() != actual {
        return Err(OntoGuideError::DigestMismatch {
            expected: expected.trim().to_string(),
            actual,
        });
    }
    Ok(serde_json::from_slice(&json)?)
}
