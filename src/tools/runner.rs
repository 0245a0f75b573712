//! Subprocess execution for external tools.

use super::invocation::{ToolInvocation, ToolOutput};
use crate::error::{Result, ToolError};
use std::process::Stdio;
use std::time::Duration;

/// Default time a single tool call may take (signing talks to a timestamp server)
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs external tools
///
/// Implementations block the caller until the child exits. [`ToolRunner::run`]
/// reports the exit status as data; [`ToolRunner::run_checked`] turns a
/// non-zero status into [`ToolError::Failed`].
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Run the invocation to completion and capture its output
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;

    /// Run the invocation and fail on a non-zero exit status
    async fn run_checked(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let output = self.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ToolError::Failed {
                tool: invocation.kind().name().to_string(),
                code: output.code,
                stderr: output.diagnostic_tail(5),
            }
            .into())
        }
    }
}

/// Runner backed by real child processes
#[derive(Debug, Clone)]
pub struct SystemToolRunner {
    timeout: Duration,
}

impl Default for SystemToolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

impl SystemToolRunner {
    /// Create a runner with a per-call timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        log::debug!("Running {}", invocation);

        let mut command = tokio::process::Command::new(invocation.program());
        command
            .args(invocation.args().iter().map(|a| a.as_os_str()))
            .envs(invocation.envs().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Interrupting the run drops this future; the child must not outlive it
            .kill_on_drop(true);

        let tool = invocation.kind().name().to_string();
        let child = command.spawn().map_err(|source| ToolError::SpawnFailed {
            tool: tool.clone(),
            path: invocation.program().to_path_buf(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ToolError::TimedOut {
                    tool,
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
        };

        let result = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("[{}] {}", tool, line);
        }
        for line in result.stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("[{} stderr] {}", tool, line);
        }
        log::debug!("{} exited with {:?}", tool, result.code);

        Ok(result)
    }
}
