//! Paper metrics extracted from a parsed Markdown source

use crate::markdown::PaperSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts used by the readiness thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetrics {
    /// Words of prose (code, tables and frontmatter excluded)
    pub word_count: usize,
    /// Fenced `mermaid` code blocks
    pub mermaid_diagrams: usize,
    /// GFM tables
    pub tables: usize,
    /// Keywords declared in frontmatter or a `Keywords:` line
    pub keyword_count: usize,
    /// Words in the abstract
    pub abstract_words: usize,
    /// Image references
    pub figures: usize,
    /// Headings of any level
    pub sections: usize,
}

impl PaperMetrics {
    /// Compute metrics for a parsed source
    #[must_use]
    pub fn from_source(source: &PaperSource) -> Self {
        Self {
            word_count: count_words(&source.prose),
            mermaid_diagrams: source.mermaid_blocks().count(),
            tables: source.tables,
            keyword_count: source.keywords.len(),
            abstract_words: source.abstract_text.as_deref().map_or(0, count_words),
            figures: source.images.len(),
            sections: source.sections.len(),
        }
    }
}

impl fmt::Display for PaperMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "words:     {}", self.word_count)?;
        writeln!(f, "diagrams:  {}", self.mermaid_diagrams)?;
        writeln!(f, "tables:    {}", self.tables)?;
        writeln!(f, "keywords:  {}", self.keyword_count)?;
        writeln!(f, "abstract:  {} words", self.abstract_words)?;
        writeln!(f, "figures:   {}", self.figures)?;
        write!(f, "sections:  {}", self.sections)
    }
}

/// Count whitespace-separated tokens that contain at least one alphanumeric character
#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}
