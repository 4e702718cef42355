use pubkit_paper::prelude::*;
use pubkit_test_utils::{registry_toml, write_fixture, PaperFixture};

async fn metrics_for(fixture: PaperFixture) -> PaperMetrics {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "paper.md", fixture.render());
    let source = PaperSource::load(&path).await.unwrap();
    PaperMetrics::from_source(&source)
}

#[tokio::test]
async fn test_default_fixture_is_ready() {
    let metrics = metrics_for(PaperFixture::default()).await;
    assert!(metrics.word_count >= 5000);
    assert_eq!(metrics.mermaid_diagrams, 4);
    assert_eq!(metrics.tables, 1);
    assert_eq!(metrics.keyword_count, 10);
    assert_eq!(metrics.abstract_words, 180);

    let report = ReadinessThresholds::default().evaluate(&metrics);
    assert!(report.ready, "{report}");
}

#[tokio::test]
async fn test_frontmatter_keywords_count() {
    let metrics = metrics_for(PaperFixture::default().with_frontmatter().keywords(12)).await;
    assert_eq!(metrics.keyword_count, 12);
    assert!(ReadinessThresholds::default().evaluate(&metrics).ready);
}

#[tokio::test]
async fn test_threshold_edges() {
    let cases = [
        (PaperFixture::default().diagrams(3), "mermaid diagrams"),
        (PaperFixture::default().keywords(7), "keywords"),
        (PaperFixture::default().keywords(13), "keywords"),
        (PaperFixture::default().abstract_words(149), "abstract words"),
        (PaperFixture::default().abstract_words(251), "abstract words"),
        (PaperFixture::default().tables(0), "tables"),
        (PaperFixture::default().body_words(4000), "words"),
    ];
    for (fixture, failing) in cases {
        let report = ReadinessThresholds::default().evaluate(&metrics_for(fixture).await);
        assert!(!report.ready);
        let failures: Vec<_> = report.failures().map(|c| c.name.as_str()).collect();
        assert_eq!(failures, vec![failing]);
    }
}

#[tokio::test]
async fn test_boundary_values_pass() {
    let fixture = PaperFixture::default().keywords(8).abstract_words(250);
    let report = ReadinessThresholds::default().evaluate(&metrics_for(fixture).await);
    assert!(report.ready, "{report}");
}

#[tokio::test]
async fn test_registry_detail_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "papers.toml", registry_toml());
    let registry = PaperRegistry::load(&path).await.unwrap();

    assert_eq!(registry.len(), 2);
    let entry = registry.by_id("edge-caching").unwrap();
    assert_eq!(entry.venue, Some(Venue::Acm));
    assert_eq!(
        registry.source_path(entry).unwrap(),
        dir.path().join("papers/edge-caching.md")
    );
    assert_eq!(
        registry.detail_paths(&["en", "de"]),
        vec![
            "/en/research/adaptive-edge-caching",
            "/en/research/log-structured-queues",
            "/de/research/adaptive-edge-caching",
            "/de/research/log-structured-queues",
        ]
    );
}
