//! Process execution for ROBOT commands.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use ontoguide_core::ToolInvocationFailure;

use crate::command::RobotCommand;

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a [`RobotCommand`] to completion.
pub struct RobotRunner;

impl RobotRunner {
    /// Spawn the command and wait for it, enforcing its timeout.
    ///
    /// The child is killed when the timeout (or a caller's deadline) drops
    /// the wait.
    pub async fn execute(command: &RobotCommand) -> Result<CommandOutput, ToolInvocationFailure> {
        let start = Instant::now();

        let (exe, args) = command.command.split_first().ok_or_else(|| {
            ToolInvocationFailure::Spawn(format!("{} has an empty command", command.name))
        })?;

        debug!(command = %command.display(), "Running ROBOT");
        let child = Command::new(exe)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolInvocationFailure::Spawn(format!("{exe}: {e}")))?;

        let waited = if command.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(command.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ToolInvocationFailure::Timeout {
                secs: command.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|e| ToolInvocationFailure::Spawn(format!("{exe}: {e}")))?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
