//! Seam between the extraction cascade and the external extraction tool.
//!
//! The orchestrator only sees [`ExtractionTool`]; production wires in the
//! ROBOT adapter, tests wire in a scripted fake.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ExtractionMethod, InvocationShape, ToolInvocationFailure};

/// One module-extraction invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub input: PathBuf,
    pub method: ExtractionMethod,
    pub shape: InvocationShape,
    /// Validated identifiers only.
    pub identifiers: Vec<String>,
    pub output: PathBuf,
    /// Where the tool may write per-invocation artifacts such as term files.
    pub scratch_dir: PathBuf,
    /// Unique per invocation; embedded in scratch file names.
    pub invocation_id: Uuid,
}

/// What a completed tool process reported.
///
/// A report is not a success verdict: the caller still checks the output
/// file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReport {
    pub exit_code: i32,
    pub stderr: String,
}

impl ToolReport {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// External module-extraction tool.
///
/// `Err` means the tool could not be run to completion (spawn failure,
/// timeout, unreadable output). A process that ran and exited non-zero is
/// reported as `Ok` with its exit code.
#[async_trait]
pub trait ExtractionTool: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ToolReport, ToolInvocationFailure>;

    /// Identifiers of named classes whose only parent is the root concept,
    /// at most `limit` of them.
    async fn top_level_classes(
        &self,
        input: &Path,
        limit: usize,
        scratch_dir: &Path,
    ) -> Result<Vec<String>, ToolInvocationFailure>;
}
