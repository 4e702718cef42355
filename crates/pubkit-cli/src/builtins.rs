//! Builtin release-gate checks: `seo` and `i18n` share one QA run, `content`
//! checks the readiness of every registry paper with a source

use pubkit_gate::{CheckOutcome, GateCheck, GateContext, GateError, GateId};
use pubkit_paper::{PaperMetrics, PaperRegistry, PaperSource, ReadinessThresholds};
use pubkit_qa::{IssueCategory, QaReport, QaSuite, UrlList};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// QA run shared by the `seo` and `i18n` gates; runs at most once
pub(crate) struct SharedQaRun {
    suite: QaSuite,
    urls: UrlList,
    out_dir: PathBuf,
    report: OnceCell<QaReport>,
}

impl SharedQaRun {
    pub(crate) fn new(suite: QaSuite, urls: UrlList, out_dir: PathBuf) -> Self {
        Self {
            suite,
            urls,
            out_dir,
            report: OnceCell::new(),
        }
    }

    async fn report(&self) -> &QaReport {
        self.report
            .get_or_init(|| async {
                let report = self.suite.run(&self.urls).await;
                if let Err(e) = report.write(&self.out_dir).await {
                    tracing::warn!(error = %e, "could not write qa report");
                }
                report
            })
            .await
    }
}

/// Gate over the QA issues of some categories
pub(crate) struct QaGate {
    gate: GateId,
    categories: &'static [IssueCategory],
    run: Arc<SharedQaRun>,
}

impl QaGate {
    pub(crate) fn seo(run: Arc<SharedQaRun>) -> Self {
        Self {
            gate: GateId::Seo,
            categories: &[IssueCategory::Availability, IssueCategory::Seo, IssueCategory::Console],
            run,
        }
    }

    pub(crate) fn i18n(run: Arc<SharedQaRun>) -> Self {
        Self {
            gate: GateId::I18n,
            categories: &[IssueCategory::I18n],
            run,
        }
    }
}

#[async_trait::async_trait]
impl GateCheck for QaGate {
    async fn run(&self, _ctx: &GateContext) -> Result<CheckOutcome, GateError> {
        let report = self.run.report().await;
        let mut output = String::new();
        let mut issues = 0;
        let root = report.root.iter().map(|r| (&r.url, &r.issues));
        let urls = report.outcomes.iter().map(|o| (&o.url, &o.issues));
        for (url, found) in root.chain(urls) {
            for issue in found.iter().filter(|i| self.categories.contains(&i.category())) {
                issues += 1;
                let _ = writeln!(output, "{url}: {}", issue.message);
            }
        }
        let checked = report.outcomes.len();
        Ok(if issues == 0 {
            CheckOutcome::pass(format!("{checked} urls checked, no {} issues", self.gate))
        } else {
            CheckOutcome::fail(format!("{issues} {} issues across {checked} urls", self.gate)).with_output(output)
        })
    }
}

/// Every registry paper with a source must meet the readiness thresholds
pub(crate) struct ContentGate {
    registry: PathBuf,
    thresholds: ReadinessThresholds,
}

impl ContentGate {
    pub(crate) fn new(registry: PathBuf, thresholds: ReadinessThresholds) -> Self {
        Self { registry, thresholds }
    }
}

#[async_trait::async_trait]
impl GateCheck for ContentGate {
    async fn run(&self, _ctx: &GateContext) -> Result<CheckOutcome, GateError> {
        let registry = PaperRegistry::load(&self.registry)
            .await
            .map_err(|e| GateError::check(GateId::Content, e.to_string()))?;

        let mut output = String::new();
        let mut checked = 0;
        let mut not_ready = 0;
        for entry in registry.iter() {
            let Some(path) = registry.source_path(entry) else { continue };
            checked += 1;
            match PaperSource::load(&path).await {
                Ok(source) => {
                    let report = self.thresholds.evaluate(&PaperMetrics::from_source(&source));
                    if !report.ready {
                        not_ready += 1;
                        for failed in report.failures() {
                            let _ = writeln!(
                                output,
                                "{}: {} is {}, expected {}",
                                entry.id, failed.name, failed.actual, failed.expected
                            );
                        }
                    }
                }
                Err(e) => {
                    not_ready += 1;
                    let _ = writeln!(output, "{}: {e}", entry.id);
                }
            }
        }

        Ok(if not_ready == 0 {
            CheckOutcome::pass(format!("{checked} papers ready"))
        } else {
            CheckOutcome::fail(format!("{not_ready} of {checked} papers not ready")).with_output(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubkit_gate::GateMode;
    use pubkit_test_utils::{registry_toml, write_fixture, PaperFixture};

    fn ctx() -> GateContext {
        GateContext {
            run_id: ulid::Ulid::new(),
            mode: GateMode::Local,
            workdir: PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn content_gate_checks_papers_with_sources() {
        let dir = tempfile::tempdir().unwrap();
        let registry = write_fixture(dir.path(), "content/papers.toml", registry_toml());
        write_fixture(dir.path(), "content/papers/edge-caching.md", PaperFixture::default().render());

        let gate = ContentGate::new(registry, ReadinessThresholds::default());
        let outcome = gate.run(&ctx()).await.unwrap();
        assert!(outcome.passed, "{}", outcome.output);
        assert_eq!(outcome.detail, "1 papers ready");

        write_fixture(
            dir.path(),
            "content/papers/edge-caching.md",
            PaperFixture::default().diagrams(2).render(),
        );
        let outcome = gate.run(&ctx()).await.unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.detail, "1 of 1 papers not ready");
        assert!(outcome.output.contains("edge-caching: mermaid diagrams is 2"));
    }

    #[tokio::test]
    async fn content_gate_errors_without_registry() {
        let gate = ContentGate::new(PathBuf::from("/nonexistent/papers.toml"), ReadinessThresholds::default());
        let err = gate.run(&ctx()).await.unwrap_err();
        assert!(matches!(err, GateError::Check { gate: GateId::Content, .. }));
    }
}
