//! Sequential fail-fast gate runner

use crate::check::{CommandCheck, CommandRunner, GateCheck, GateContext, TokioCommandRunner};
use crate::plan::{GateAction, GateId, GateMode, GatePlan, GateStep};
use crate::summary::{tail_lines, GateResult, GateStatus, GateSummary, OUTPUT_TAIL_LINES};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use ulid::Ulid;

/// Runs a [`GatePlan`] step by step, stopping at the first failure
pub struct ReleaseGate {
    workdir: PathBuf,
    runner: Arc<dyn CommandRunner>,
    builtins: HashMap<GateId, Arc<dyn GateCheck>>,
}

impl std::fmt::Debug for ReleaseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builtins: Vec<_> = self.builtins.keys().collect();
        builtins.sort();
        f.debug_struct("ReleaseGate")
            .field("workdir", &self.workdir)
            .field("builtins", &builtins)
            .finish_non_exhaustive()
    }
}

impl ReleaseGate {
    /// Gate running commands in `workdir` through `tokio::process`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self::with_runner(workdir, Arc::new(TokioCommandRunner))
    }

    /// Gate with a custom command runner
    pub fn with_runner(workdir: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            workdir: workdir.into(),
            runner,
            builtins: HashMap::new(),
        }
    }

    /// Register the check behind a `builtin` step
    #[must_use]
    pub fn with_builtin(mut self, id: GateId, check: Arc<dyn GateCheck>) -> Self {
        self.builtins.insert(id, check);
        self
    }

    /// Run every step of `plan` that applies to `mode`
    pub async fn run(&self, plan: &GatePlan, mode: GateMode) -> GateSummary {
        let ctx = GateContext {
            run_id: Ulid::new(),
            mode,
            workdir: self.workdir.clone(),
        };
        let started_at = chrono::Utc::now();
        let clock = Instant::now();
        tracing::info!(run_id = %ctx.run_id, %mode, steps = plan.steps().len(), "release gate started");

        let mut results = Vec::with_capacity(plan.steps().len());
        let mut failed_gate: Option<GateId> = None;

        for step in plan.steps() {
            if let Some(failed) = failed_gate {
                results.push(GateResult::without_run(
                    step.id,
                    GateStatus::NotRun,
                    format!("not run: {failed} failed"),
                ));
                continue;
            }
            if !step.runs_in(mode) {
                tracing::info!(gate = %step.id, "skipped (ci only)");
                results.push(GateResult::without_run(
                    step.id,
                    GateStatus::Skipped,
                    format!("ci only, skipped in {mode} mode"),
                ));
                continue;
            }

            let result = self.run_step(step, &ctx).await;
            if result.status == GateStatus::Failed {
                tracing::error!(gate = %step.id, detail = %result.detail, "gate failed");
                failed_gate = Some(step.id);
            } else {
                tracing::info!(gate = %step.id, duration_ms = result.duration_ms, "gate passed");
            }
            results.push(result);
        }

        let summary = GateSummary {
            run_id: ctx.run_id,
            mode,
            started_at,
            finished_at: chrono::Utc::now(),
            duration_ms: elapsed_ms(clock),
            results,
            failed_gate,
            ready: failed_gate.is_none(),
        };
        tracing::info!(ready = summary.ready, duration_ms = summary.duration_ms, "release gate finished");
        summary
    }

    async fn run_step(&self, step: &GateStep, ctx: &GateContext) -> GateResult {
        let check: Arc<dyn GateCheck> = match &step.action {
            GateAction::Command { program, args, env } => Arc::new(CommandCheck::new(
                step.id,
                program.clone(),
                args.clone(),
                env.clone(),
                Arc::clone(&self.runner),
            )),
            GateAction::Builtin => match self.builtins.get(&step.id) {
                Some(check) => Arc::clone(check),
                None => {
                    return GateResult::without_run(
                        step.id,
                        GateStatus::Failed,
                        format!("no builtin check registered for '{}'", step.id),
                    );
                }
            },
        };

        tracing::info!(gate = %step.id, "running gate");
        let clock = Instant::now();
        let timeout = Duration::from_secs(step.timeout_secs);
        let outcome = tokio::time::timeout(timeout, check.run(ctx)).await;
        let duration_ms = elapsed_ms(clock);

        match outcome {
            Ok(Ok(outcome)) => GateResult {
                id: step.id,
                status: if outcome.passed {
                    GateStatus::Passed
                } else {
                    GateStatus::Failed
                },
                duration_ms,
                exit_code: outcome.exit_code,
                detail: outcome.detail,
                output_tail: tail_lines(&outcome.output, OUTPUT_TAIL_LINES),
            },
            Ok(Err(e)) => GateResult {
                duration_ms,
                ..GateResult::without_run(step.id, GateStatus::Failed, e.to_string())
            },
            Err(_) => GateResult {
                duration_ms,
                ..GateResult::without_run(
                    step.id,
                    GateStatus::Failed,
                    format!("timed out after {}s", step.timeout_secs),
                )
            },
        }
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}
