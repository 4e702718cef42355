//! Camera-ready normalization of `.tex` and `.md` paper sources
//!
//! The normalizer runs an ordered list of [`Pass`]es over a document:
//!
//! ```text
//! strip-metadata → document-class → author-block → section-numbers
//!   → abstract-opening → duplicate-sentences → greek → stray-braces
//! ```
//!
//! The pipeline is repeated until a round changes nothing, so the result is
//! a fixed point: normalizing an already normalized file is a no-op. If the
//! pipeline has not settled after `max_rounds`, [`Normalizer::normalize_checked`]
//! reports the pass that is still changing the document.

use crate::error::LatexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod passes;
pub(crate) mod scan;
mod venue;

pub use passes::Pass;
pub use venue::{escape, Author, Venue};

/// Kind of source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Latex,
    Markdown,
}

impl DocKind {
    /// Detect from file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "tex" => Some(Self::Latex),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// Normalization settings (the `[latex]` config section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexOptions {
    /// Target venue
    pub venue: Venue,
    /// Authors injected as the venue's author block; empty leaves authors alone
    pub authors: Vec<Author>,
    /// Canonical abstract opening; `None` only collapses repeated phrases
    pub abstract_opening: Option<String>,
    /// Extra forbidden-metadata line patterns (regex)
    pub forbidden_patterns: Vec<String>,
    /// Upper bound on pipeline rounds before giving up
    pub max_rounds: usize,
}

impl Default for LatexOptions {
    fn default() -> Self {
        Self {
            venue: Venue::default(),
            authors: Vec::new(),
            abstract_opening: Some("This paper presents".to_string()),
            forbidden_patterns: Vec::new(),
            max_rounds: 4,
        }
    }
}

/// Per-pass outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub name: String,
    pub changed: bool,
}

/// Result of normalizing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub output: String,
    pub passes: Vec<PassReport>,
    pub changed: bool,
    /// Rounds executed, including the final no-op round
    pub rounds: usize,
    /// Pass still changing the text when `max_rounds` ran out
    pub unsettled: Option<String>,
}

/// Ordered pass pipeline
#[derive(Debug)]
pub struct Normalizer {
    passes: Vec<Box<dyn Pass>>,
    max_rounds: usize,
}

impl Normalizer {
    /// Pipeline from explicit passes
    #[must_use]
    pub fn new(passes: Vec<Box<dyn Pass>>, max_rounds: usize) -> Self {
        Self {
            passes,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Default pipeline for the configured venue
    pub fn from_options(options: &LatexOptions) -> Result<Self, LatexError> {
        let author_block = if options.authors.is_empty() {
            String::new()
        } else {
            options.venue.render_authors(&options.authors)
        };
        let passes: Vec<Box<dyn Pass>> = vec![
            Box::new(passes::StripMetadata::with_extra(options.forbidden_patterns.as_slice())?),
            Box::new(passes::DocumentClass::new(options.venue.document_class())),
            Box::new(passes::AuthorBlock::new(author_block)),
            Box::new(passes::SectionNumbers),
            Box::new(passes::AbstractOpening::new(options.abstract_opening.clone())),
            Box::new(passes::DuplicateSentences),
            Box::new(passes::GreekLetters),
            Box::new(passes::StrayBraces),
        ];
        Ok(Self::new(passes, options.max_rounds))
    }

    /// Default pipeline for a venue with default options
    pub fn for_venue(venue: Venue) -> Result<Self, LatexError> {
        Self::from_options(&LatexOptions {
            venue,
            ..LatexOptions::default()
        })
    }

    /// Names of the passes in order
    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|p| p.name())
    }

    /// Run the pipeline to a fixed point (bounded by `max_rounds`)
    #[must_use]
    pub fn normalize(&self, text: &str, kind: DocKind) -> NormalizeOutcome {
        let mut reports: Vec<PassReport> = self
            .passes
            .iter()
            .map(|p| PassReport {
                name: p.name().to_string(),
                changed: false,
            })
            .collect();
        let mut current = text.to_string();
        let mut rounds = 0;
        let mut unsettled = None;

        loop {
            rounds += 1;
            let mut first_change: Option<&'static str> = None;
            for (pass, report) in self.passes.iter().zip(reports.iter_mut()) {
                if !pass.applies_to(kind) {
                    continue;
                }
                let next = pass.apply(&current, kind);
                if next != current.as_str() {
                    tracing::trace!(pass = pass.name(), round = rounds, "pass changed document");
                    report.changed = true;
                    first_change.get_or_insert(pass.name());
                    current = next.into_owned();
                }
            }
            match first_change {
                None => break,
                Some(name) if rounds >= self.max_rounds => {
                    unsettled = Some(name.to_string());
                    break;
                }
                Some(_) => {}
            }
        }

        NormalizeOutcome {
            changed: current != text,
            output: current,
            passes: reports,
            rounds,
            unsettled,
        }
    }

    /// Normalize and fail if the pipeline did not reach a fixed point
    pub fn normalize_checked(&self, text: &str, kind: DocKind) -> Result<NormalizeOutcome, LatexError> {
        let outcome = self.normalize(text, kind);
        match &outcome.unsettled {
            Some(pass) => Err(LatexError::NotIdempotent { pass: pass.clone() }),
            None => Ok(outcome),
        }
    }

    /// Normalize a file on disk
    pub async fn normalize_file(&self, path: impl AsRef<Path>, mode: Mode) -> Result<FileReport, LatexError> {
        let path = path.as_ref();
        let kind = DocKind::from_path(path).ok_or_else(|| LatexError::UnsupportedFile(path.to_path_buf()))?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LatexError::io_error(path, e))?;

        let outcome = self.normalize_checked(&text, kind)?;
        let written = mode == Mode::Write && outcome.changed;
        if written {
            write_atomic(path, &outcome.output).await?;
            tracing::info!(path = %path.display(), "normalized");
        } else if outcome.changed {
            tracing::info!(path = %path.display(), ?mode, "would normalize");
        } else {
            tracing::debug!(path = %path.display(), "already normalized");
        }

        Ok(FileReport {
            path: path.to_path_buf(),
            kind,
            changed: outcome.changed,
            written,
            passes: outcome
                .passes
                .into_iter()
                .filter(|p| p.changed)
                .map(|p| p.name)
                .collect(),
        })
    }
}

/// What [`Normalizer::normalize_file`] does with the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write changed files in place
    Write,
    /// Report without writing
    DryRun,
    /// Report whether the file is already normalized
    Check,
}

/// Outcome for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub kind: DocKind,
    pub changed: bool,
    pub written: bool,
    /// Names of passes that changed the file
    pub passes: Vec<String>,
}

/// Write through a sibling temp file and rename over the target
async fn write_atomic(path: &Path, contents: &str) -> Result<(), LatexError> {
    let mut tmp_name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    tmp_name.push(".pubkit-tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| LatexError::io_error(&tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(LatexError::io_error(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;

    /// Appends a marker every time, so it never settles
    struct Restless;

    impl Pass for Restless {
        fn name(&self) -> &'static str {
            "restless"
        }

        fn apply<'a>(&self, text: &'a str, _kind: DocKind) -> Cow<'a, str> {
            Cow::Owned(format!("{text}!"))
        }
    }

    #[test]
    fn doc_kind_from_extension() {
        assert_eq!(DocKind::from_path(Path::new("main.tex")), Some(DocKind::Latex));
        assert_eq!(DocKind::from_path(Path::new("paper.MD")), Some(DocKind::Markdown));
        assert_eq!(DocKind::from_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn default_pipeline_order() {
        let normalizer = Normalizer::for_venue(Venue::Arxiv).unwrap();
        let names: Vec<_> = normalizer.pass_names().collect();
        assert_eq!(
            names,
            vec![
                "strip-metadata",
                "document-class",
                "author-block",
                "section-numbers",
                "abstract-opening",
                "duplicate-sentences",
                "greek",
                "stray-braces",
            ]
        );
    }

    #[test]
    fn normalizes_latex_document() {
        let input = "\\documentclass{article}\n\\title{Caching}\n\\date{2024}\n\\begin{document}\n\\begin{abstract}\nThis paper presents This paper presents a cache with hit rate α.\n\\end{abstract}\n\\section{1. Introduction}\nWarm caches help. Warm caches help.}\n\\end{document}\n";
        let normalizer = Normalizer::for_venue(Venue::Ieee).unwrap();
        let outcome = normalizer.normalize_checked(input, DocKind::Latex).unwrap();
        assert_eq!(
            outcome.output,
            "\\documentclass[conference]{IEEEtran}\n\\title{Caching}\n\\begin{document}\n\\begin{abstract}\nThis paper presents a cache with hit rate \\ensuremath{\\alpha}.\n\\end{abstract}\n\\section{Introduction}\nWarm caches help.\n\\end{document}\n"
        );
        assert!(outcome.changed);

        let again = normalizer.normalize(&outcome.output, DocKind::Latex);
        assert!(!again.changed);
        assert_eq!(again.rounds, 1);
    }

    #[test]
    fn restless_pass_is_reported() {
        let normalizer = Normalizer::new(vec![Box::new(Restless)], 3);
        let err = normalizer.normalize_checked("x", DocKind::Markdown).unwrap_err();
        assert!(matches!(err, LatexError::NotIdempotent { pass } if pass == "restless"));
    }

    #[tokio::test]
    async fn normalize_file_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.md");
        std::fs::write(&path, "# Title\nStatus: draft\n\n## 1. Intro\n").unwrap();
        let normalizer = Normalizer::for_venue(Venue::Arxiv).unwrap();

        let check = normalizer.normalize_file(&path, Mode::Check).await.unwrap();
        assert!(check.changed);
        assert!(!check.written);

        let written = normalizer.normalize_file(&path, Mode::Write).await.unwrap();
        assert!(written.written);
        assert_eq!(written.passes, vec!["strip-metadata", "section-numbers"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\n\n## Intro\n");

        let after = normalizer.normalize_file(&path, Mode::Check).await.unwrap();
        assert!(!after.changed);
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let normalizer = Normalizer::for_venue(Venue::Arxiv).unwrap();
        let err = normalizer.normalize_file("notes.txt", Mode::Check).await.unwrap_err();
        assert!(matches!(err, LatexError::UnsupportedFile(_)));
    }
}
