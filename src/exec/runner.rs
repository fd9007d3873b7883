//! Command runner - spawns external tools with a timeout

use crate::error::InstallError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default timeout for short cluster/tool invocations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A fully composed command invocation
///
/// Kept as data rather than a spawned process so the same invocation can be
/// re-run verbatim (the deploy retry) and embedded in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of one external command invocation
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Trait for running external commands - allows for different implementations
///
/// `run` never errors for a non-zero exit or a timeout; callers inspect the
/// returned [`CommandResult`]. Spawn failures (binary unresolvable, fork
/// failure) surface as [`InstallError::Io`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion or until the timeout elapses
    async fn run(
        &self,
        cmd: &CommandLine,
        timeout: Duration,
    ) -> Result<CommandResult, InstallError>;

    /// Run and convert a timeout or non-zero exit into an error
    async fn run_checked(
        &self,
        cmd: &CommandLine,
        timeout: Duration,
    ) -> Result<CommandResult, InstallError> {
        let result = self.run(cmd, timeout).await?;
        if result.timed_out {
            return Err(InstallError::CommandTimedOut {
                command: cmd.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        if result.exit_code != 0 {
            return Err(InstallError::CommandFailed {
                command: cmd.to_string(),
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }
        Ok(result)
    }
}

/// Runner backed by real OS processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        cmd: &CommandLine,
        timeout_duration: Duration,
    ) -> Result<CommandResult, InstallError> {
        debug!(
            "running `{}` (timeout {}s)",
            cmd,
            timeout_duration.as_secs()
        );

        let spawned = timeout(
            timeout_duration,
            Command::new(cmd.program())
                .args(cmd.argv())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match spawned {
            Err(_) => {
                warn!("`{}` timed out after {}s", cmd, timeout_duration.as_secs());
                return Ok(CommandResult {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: String::new(),
                    timed_out: true,
                });
            }
            Ok(result) => result?,
        };

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            debug!(
                "`{}` exited with code {}: {}",
                cmd,
                exit_code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(CommandResult {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
        })
    }
}
