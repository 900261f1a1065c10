//! [`ExtractionTool`] backed by the ROBOT command-line tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use ontoguide_core::{
    ExtractionRequest, ExtractionTool, InvocationShape, ToolInvocationFailure, ToolReport,
};

use crate::command::RobotCommand;
use crate::query::{parse_class_bindings, top_level_classes_query};
use crate::runner::RobotRunner;

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Drives `robot extract` and `robot query`.
///
/// Scratch files (term lists, queries, query results) carry a fresh UUID so
/// concurrent invocations never collide; they are removed afterwards, also
/// when the invocation is cancelled.
#[derive(Debug, Clone)]
pub struct RobotTool {
    bin: String,
    timeout: Duration,
}

impl Default for RobotTool {
    fn default() -> Self {
        Self::new("robot")
    }
}

impl RobotTool {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    fn report(&self, name: &str, exit_code: i32, stderr: String) -> ToolReport {
        if exit_code != 0 {
            warn!(command = name, exit_code, stderr = %stderr.trim(), "ROBOT failed");
        } else if !stderr.trim().is_empty() {
            debug!(command = name, stderr = %stderr.trim(), "ROBOT stderr");
        }
        ToolReport { exit_code, stderr }
    }
}

/// Scratch file removed when dropped, including when the invocation future
/// is cancelled by a deadline.
#[derive(Debug)]
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn reserve(dir: &Path, stem: &str, id: Uuid, ext: &str) -> Self {
        Self {
            path: dir.join(format!("{stem}_{id}.{ext}")),
        }
    }

    async fn create(
        dir: &Path,
        stem: &str,
        id: Uuid,
        ext: &str,
        contents: &str,
    ) -> Result<Self, ToolInvocationFailure> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ToolInvocationFailure::Spawn(format!("cannot create {}: {e}", dir.display()))
        })?;
        let file = Self::reserve(dir, stem, id, ext);
        tokio::fs::write(&file.path, contents).await.map_err(|e| {
            ToolInvocationFailure::Spawn(format!("cannot write {}: {e}", file.path.display()))
        })?;
        Ok(file)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %self.path.display(), error = %e, "Could not remove scratch file");
            }
        }
    }
}

#[async_trait]
impl ExtractionTool for RobotTool {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ToolReport, ToolInvocationFailure> {
        if let Some(parent) = request.output.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolInvocationFailure::Spawn(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let term_file = match request.shape {
            InvocationShape::TermFile => {
                let mut contents = request.identifiers.join("\n");
                contents.push('\n');
                Some(
                    ScratchFile::create(
                        &request.scratch_dir,
                        "terms",
                        request.invocation_id,
                        "txt",
                        &contents,
                    )
                    .await?,
                )
            }
            InvocationShape::IndividualTerms => None,
        };

        let command = RobotCommand::extract(
            &self.bin,
            request,
            term_file.as_ref().map(ScratchFile::path),
            self.timeout.as_secs(),
        );
        let output = RobotRunner::execute(&command).await?;
        Ok(self.report(&command.name, output.exit_code, output.stderr))
    }

    async fn top_level_classes(
        &self,
        input: &Path,
        limit: usize,
        scratch_dir: &Path,
    ) -> Result<Vec<String>, ToolInvocationFailure> {
        let id = Uuid::new_v4();
        let query_file = ScratchFile::create(
            scratch_dir,
            "top_classes",
            id,
            "sparql",
            &top_level_classes_query(limit),
        )
        .await?;
        let result_file = ScratchFile::reserve(scratch_dir, "top_classes", id, "json");

        let command = RobotCommand::query(
            &self.bin,
            input,
            query_file.path(),
            result_file.path(),
            self.timeout.as_secs(),
        );

        let output = RobotRunner::execute(&command).await?;
        if !output.passed() {
            let report = self.report(&command.name, output.exit_code, output.stderr);
            return Err(ToolInvocationFailure::NonZeroExit {
                code: report.exit_code,
                stderr: report.stderr,
            });
        }
        let raw = tokio::fs::read_to_string(result_file.path())
            .await
            .map_err(|_| ToolInvocationFailure::MissingOutput {
                path: result_file.path().to_path_buf(),
            })?;
        let mut classes = parse_class_bindings(&raw)?;
        classes.truncate(limit);
        debug!(count = classes.len(), "Top-level classes found");
        Ok(classes)
    }
}
