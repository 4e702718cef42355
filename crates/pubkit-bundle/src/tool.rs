//! External tool invocation (pandoc, SVG converters)

use crate::error::BundleError;
use std::path::Path;
use std::process::Stdio;

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the tool exited with status 0
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Convert a failing output into [`BundleError::ToolFailed`]
    pub fn check(self, program: &str) -> Result<Self, BundleError> {
        if self.success() {
            Ok(self)
        } else {
            Err(BundleError::ToolFailed {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external programs
///
/// Implement this to substitute the real process layer in tests.
#[async_trait::async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args` in `cwd` and wait for it to finish
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, BundleError>;
}

/// [`ToolRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessToolRunner;

#[async_trait::async_trait]
impl ToolRunner for ProcessToolRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, BundleError> {
        tracing::debug!(program, ?args, cwd = %cwd.display(), "running tool");
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BundleError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_success_through() {
        let ok = ToolOutput {
            status: Some(0),
            ..ToolOutput::default()
        };
        assert!(ok.check("pandoc").is_ok());

        let failed = ToolOutput {
            status: Some(1),
            stderr: "  boom \n".to_string(),
            ..ToolOutput::default()
        };
        let err = failed.check("pandoc").unwrap_err();
        assert!(matches!(err, BundleError::ToolFailed { ref stderr, .. } if stderr == "boom"));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessToolRunner
            .run("pubkit-definitely-not-installed", &[], dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, BundleError::Spawn { .. }));
    }
}
