//! Gate results and the written summary

use crate::error::GateError;
use crate::plan::{GateId, GateMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Lines of command output kept per gate
pub const OUTPUT_TAIL_LINES: usize = 40;

/// Final state of one gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Passed,
    Failed,
    /// Not applicable in this mode
    Skipped,
    /// An earlier gate failed
    NotRun,
}

impl GateStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::NotRun => "not run",
        }
    }
}

/// Outcome of one gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub id: GateId,
    pub status: GateStatus,
    pub duration_ms: u64,
    pub exit_code: Option<i32>,
    pub detail: String,
    /// Last [`OUTPUT_TAIL_LINES`] lines of output
    pub output_tail: String,
}

impl GateResult {
    pub(crate) fn without_run(id: GateId, status: GateStatus, detail: impl Into<String>) -> Self {
        Self {
            id,
            status,
            duration_ms: 0,
            exit_code: None,
            detail: detail.into(),
            output_tail: String::new(),
        }
    }
}

/// Summary of a whole gate run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSummary {
    pub run_id: Ulid,
    pub mode: GateMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub results: Vec<GateResult>,
    pub failed_gate: Option<GateId>,
    pub ready: bool,
}

impl GateSummary {
    /// Result for a gate, if it was in the plan
    pub fn result(&self, id: GateId) -> Option<&GateResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// Write `summary.json` and `summary.md` into `dir`
    pub async fn write(&self, dir: &Path) -> Result<(PathBuf, PathBuf), GateError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| GateError::io_error(dir, e))?;

        let json_path = dir.join("summary.json");
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&json_path, json)
            .await
            .map_err(|e| GateError::io_error(&json_path, e))?;

        let md_path = dir.join("summary.md");
        tokio::fs::write(&md_path, self.to_markdown())
            .await
            .map_err(|e| GateError::io_error(&md_path, e))?;

        tracing::info!(dir = %dir.display(), "gate summary written");
        Ok((json_path, md_path))
    }

    /// Markdown rendering: verdict, status table, failure tail
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let verdict = if self.ready { "READY" } else { "NOT READY" };
        let _ = writeln!(out, "# Release gate: {verdict}\n");
        let _ = writeln!(
            out,
            "Run `{}` in `{}` mode, {} ms, started {}.\n",
            self.run_id,
            self.mode,
            self.duration_ms,
            self.started_at.to_rfc3339()
        );
        out.push_str("| gate | status | duration | detail |\n");
        out.push_str("|------|--------|----------|--------|\n");
        for r in &self.results {
            let _ = writeln!(
                out,
                "| {} | {} | {} ms | {} |",
                r.id,
                r.status.as_str(),
                r.duration_ms,
                r.detail.replace('|', "\\|")
            );
        }
        if let Some(failed) = self.failed_gate.and_then(|id| self.result(id)) {
            let _ = writeln!(out, "\n## Failure: {}\n\n{}", failed.id, failed.detail);
            if !failed.output_tail.is_empty() {
                let _ = writeln!(out, "\n```text\n{}\n```", failed.output_tail.trim_end());
            }
        }
        out
    }
}

/// Last `n` lines of `output`
#[must_use]
pub fn tail_lines(output: &str, n: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
