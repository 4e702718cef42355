use pubkit_gate::{
    CheckOutcome, CommandOutput, CommandRunner, GateAction, GateCheck, GateContext, GateError, GateId,
    GateMode, GatePlan, GateStatus, GateStep, GateSummary, ReleaseGate,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mockall::mock! {
    Runner {}

    #[async_trait::async_trait]
    impl CommandRunner for Runner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            env: &BTreeMap<String, String>,
            cwd: &Path,
        ) -> Result<CommandOutput, GateError>;
    }
}

struct Fixed(bool);

#[async_trait::async_trait]
impl GateCheck for Fixed {
    async fn run(&self, _ctx: &GateContext) -> Result<CheckOutcome, GateError> {
        Ok(if self.0 {
            CheckOutcome::pass("ok")
        } else {
            CheckOutcome::fail("3 issues").with_output("missing hreflang on /de/about\n")
        })
    }
}

struct Slow;

#[async_trait::async_trait]
impl GateCheck for Slow {
    async fn run(&self, _ctx: &GateContext) -> Result<CheckOutcome, GateError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(CheckOutcome::pass("late"))
    }
}

fn ok_output() -> Result<CommandOutput, GateError> {
    Ok(CommandOutput {
        status: Some(0),
        output: "done\n".to_string(),
    })
}

fn gate(runner: MockRunner) -> ReleaseGate {
    ReleaseGate::with_runner(".", Arc::new(runner))
        .with_builtin(GateId::Seo, Arc::new(Fixed(true)))
        .with_builtin(GateId::I18n, Arc::new(Fixed(true)))
        .with_builtin(GateId::Content, Arc::new(Fixed(true)))
}

fn statuses(summary: &GateSummary) -> Vec<(GateId, GateStatus)> {
    summary.results.iter().map(|r| (r.id, r.status)).collect()
}

#[tokio::test]
async fn test_all_gates_pass_in_ci() {
    let mut runner = MockRunner::new();
    runner.expect_run().times(5).returning(|_, _, _, _| ok_output());

    let summary = gate(runner).run(&GatePlan::default_plan(), GateMode::Ci).await;
    assert!(summary.ready);
    assert_eq!(summary.failed_gate, None);
    assert_eq!(summary.results.len(), 8);
    assert!(summary.results.iter().all(|r| r.status == GateStatus::Passed));
}

#[tokio::test]
async fn test_first_failure_stops_the_run() {
    let mut runner = MockRunner::new();
    runner.expect_run().times(3).returning(|_, args, _, _| {
        if args.iter().any(|a| a == "build") {
            let output: String = (1..=60).map(|i| format!("build line {i}\n")).collect();
            Ok(CommandOutput {
                status: Some(1),
                output,
            })
        } else {
            ok_output()
        }
    });

    let summary = gate(runner).run(&GatePlan::default_plan(), GateMode::Ci).await;
    assert!(!summary.ready);
    assert_eq!(summary.failed_gate, Some(GateId::Build));
    assert_eq!(
        statuses(&summary),
        vec![
            (GateId::Lint, GateStatus::Passed),
            (GateId::Typecheck, GateStatus::Passed),
            (GateId::Build, GateStatus::Failed),
            (GateId::Seo, GateStatus::NotRun),
            (GateId::Performance, GateStatus::NotRun),
            (GateId::Security, GateStatus::NotRun),
            (GateId::I18n, GateStatus::NotRun),
            (GateId::Content, GateStatus::NotRun),
        ]
    );
    let build = summary.result(GateId::Build).unwrap();
    assert_eq!(build.exit_code, Some(1));
    assert_eq!(build.output_tail.lines().count(), 40);
    assert!(build.output_tail.starts_with("build line 21"));
}

#[tokio::test]
async fn test_local_mode_skips_ci_only() {
    let mut runner = MockRunner::new();
    runner
        .expect_run()
        .times(3)
        .returning(|program, _, env, _| {
            assert_eq!(program, "npm");
            assert!(!env.contains_key("CI"));
            ok_output()
        });

    let summary = gate(runner).run(&GatePlan::default_plan(), GateMode::Local).await;
    assert!(summary.ready);
    assert_eq!(summary.result(GateId::Performance).unwrap().status, GateStatus::Skipped);
    assert_eq!(summary.result(GateId::Security).unwrap().status, GateStatus::Skipped);
}

#[tokio::test]
async fn test_builtin_failure_and_missing_builtin() {
    let plan = GatePlan::new(vec![
        GateStep::new(GateId::Seo, GateAction::Builtin),
        GateStep::new(GateId::I18n, GateAction::Builtin),
    ])
    .unwrap();

    let failing = ReleaseGate::with_runner(".", Arc::new(MockRunner::new()))
        .with_builtin(GateId::Seo, Arc::new(Fixed(false)));
    let summary = failing.run(&plan, GateMode::Ci).await;
    assert_eq!(summary.failed_gate, Some(GateId::Seo));
    assert_eq!(summary.result(GateId::Seo).unwrap().detail, "3 issues");

    let missing = ReleaseGate::with_runner(".", Arc::new(MockRunner::new()))
        .with_builtin(GateId::Seo, Arc::new(Fixed(true)));
    let summary = missing.run(&plan, GateMode::Ci).await;
    assert_eq!(summary.failed_gate, Some(GateId::I18n));
    assert!(summary
        .result(GateId::I18n)
        .unwrap()
        .detail
        .contains("no builtin check registered"));
}

#[tokio::test]
async fn test_spawn_error_and_timeout_fail_the_gate() {
    let mut runner = MockRunner::new();
    runner.expect_run().times(1).returning(|program, _, _, _| {
        Err(GateError::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });
    let plan = GatePlan::new(vec![GateStep::new(GateId::Lint, GateAction::command("eslint", ["."]))]).unwrap();
    let summary = ReleaseGate::with_runner(".", Arc::new(runner)).run(&plan, GateMode::Ci).await;
    assert_eq!(summary.failed_gate, Some(GateId::Lint));
    assert!(summary.results[0].detail.contains("failed to start eslint"));

    let plan = GatePlan::new(vec![GateStep::new(GateId::Content, GateAction::Builtin).timeout_secs(0)]).unwrap();
    let summary = ReleaseGate::with_runner(".", Arc::new(MockRunner::new()))
        .with_builtin(GateId::Content, Arc::new(Slow))
        .run(&plan, GateMode::Ci)
        .await;
    assert_eq!(summary.results[0].status, GateStatus::Failed);
    assert_eq!(summary.results[0].detail, "timed out after 0s");
}

#[tokio::test]
async fn test_summary_files() {
    let mut runner = MockRunner::new();
    runner.expect_run().returning(|_, _, _, _| ok_output());
    let summary = gate(runner).run(&GatePlan::default_plan(), GateMode::Local).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("artifacts/release-gate");
    let (json, md) = summary.write(&out).await.unwrap();

    let parsed: GateSummary = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(parsed, summary);
    let md = std::fs::read_to_string(md).unwrap();
    assert!(md.starts_with("# Release gate: READY"));
    assert!(md.contains("| performance | skipped |"));
}
