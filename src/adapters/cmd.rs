use crate::error::ToolError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

// Every external tool (ffprobe, ffmpeg, mpv) goes through this seam so that adapters can
// be tested against canned output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ToolOutput, ToolError>;
}

/// Runs tools as child processes. The child is killed when the deadline passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ToolOutput, ToolError> {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result.map_err(|source| ToolError::Spawn {
                program: program.to_string(),
                source,
            })?,
            Err(_) => {
                tracing::warn!(program, ?timeout, "tool timed out, killing it");
                return Err(ToolError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            tracing::debug!(program, args = %args.join(" "), "tool failed");
            return Err(ToolError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// Builds an owned argument list.
pub(crate) fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
