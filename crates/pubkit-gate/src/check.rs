//! Gate checks and the command runner seam

use crate::error::GateError;
use crate::plan::{GateId, GateMode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use ulid::Ulid;

/// Finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub status: Option<i32>,
    /// Stdout followed by stderr
    pub output: String,
}

/// Runs gate commands
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture combined output
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        cwd: &Path,
    ) -> Result<CommandOutput, GateError>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait::async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        cwd: &Path,
    ) -> Result<CommandOutput, GateError> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .envs(env)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| GateError::Spawn {
                program: program.to_string(),
                source,
            })?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput {
            status: output.status.code(),
            output: combined,
        })
    }
}

/// Shared state handed to every check
#[derive(Debug, Clone)]
pub struct GateContext {
    pub run_id: Ulid,
    pub mode: GateMode,
    /// Working directory for commands (the site repository)
    pub workdir: PathBuf,
}

/// Result of one check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub exit_code: Option<i32>,
    /// One-line explanation
    pub detail: String,
    /// Full output; the summary keeps only its tail
    pub output: String,
}

impl CheckOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
            ..Self::default()
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

/// One gate's check
#[async_trait::async_trait]
pub trait GateCheck: Send + Sync {
    /// Run the check; `Err` means the check itself could not run
    async fn run(&self, ctx: &GateContext) -> Result<CheckOutcome, GateError>;
}

/// Check that runs an external command and passes on exit status 0
pub struct CommandCheck {
    gate: GateId,
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for CommandCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandCheck")
            .field("gate", &self.gate)
            .field("program", &self.program)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl CommandCheck {
    pub fn new(
        gate: GateId,
        program: impl Into<String>,
        args: Vec<String>,
        env: BTreeMap<String, String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            gate,
            program: program.into(),
            args,
            env,
            runner,
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait::async_trait]
impl GateCheck for CommandCheck {
    async fn run(&self, ctx: &GateContext) -> Result<CheckOutcome, GateError> {
        let mut env = self.env.clone();
        if ctx.mode == GateMode::Ci {
            env.entry("CI".to_string()).or_insert_with(|| "true".to_string());
        }
        tracing::debug!(gate = %self.gate, command = %self.command_line(), "running gate command");
        let result = self.runner.run(&self.program, &self.args, &env, &ctx.workdir).await?;

        let outcome = match result.status {
            Some(0) => CheckOutcome::pass(format!("`{}` succeeded", self.command_line())),
            Some(code) => CheckOutcome::fail(format!("`{}` exited with {code}", self.command_line())),
            None => CheckOutcome::fail(format!("`{}` was terminated by a signal", self.command_line())),
        };
        Ok(CheckOutcome {
            exit_code: result.status,
            ..outcome.with_output(result.output)
        })
    }
}
