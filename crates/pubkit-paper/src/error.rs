//! Error types for paper processing
//!
//! Provides error handling for:
//! - Markdown source loading and frontmatter parsing
//! - Paper registry validation
//! - LaTeX/Markdown normalization

use std::path::PathBuf;

/// Errors while reading or parsing a Markdown paper source
#[derive(Debug, thiserror::Error)]
pub enum PaperError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Frontmatter block is not valid YAML
    #[error("invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    /// Frontmatter opened with `---` but never closed
    #[error("unterminated frontmatter block")]
    UnterminatedFrontmatter,
}

impl PaperError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while loading or validating the paper registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two entries share an id
    #[error("duplicate paper id: {0}")]
    DuplicateId(String),

    /// Two entries share a slug
    #[error("duplicate paper slug: {0}")]
    DuplicateSlug(String),

    /// Slug is not lowercase kebab-case
    #[error("invalid slug '{0}': expected lowercase kebab-case")]
    InvalidSlug(String),

    /// Entry has an empty title
    #[error("paper '{0}' has an empty title")]
    EmptyTitle(String),

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry file could not be decoded
    #[error("invalid registry file {path}: {message}")]
    Format { path: PathBuf, message: String },
}

/// Errors during LaTeX/Markdown normalization
#[derive(Debug, thiserror::Error)]
pub enum LatexError {
    /// File extension is not `.tex`, `.md` or `.markdown`
    #[error("unsupported file type: {0}")]
    UnsupportedFile(PathBuf),

    /// Pipeline did not reach a fixed point
    #[error("normalization is not idempotent: pass '{pass}' keeps changing the document")]
    NotIdempotent { pass: String },

    /// Unknown venue name
    #[error("unknown venue: '{0}' (expected arxiv, acm or ieee)")]
    UnknownVenue(String),

    /// Configured metadata pattern failed to compile
    #[error("invalid metadata pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// IO error during file read or write
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LatexError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::InvalidSlug("Bad Slug".to_string());
        assert_eq!(
            err.to_string(),
            "invalid slug 'Bad Slug': expected lowercase kebab-case"
        );
    }

    #[test]
    fn latex_error_display() {
        let err = LatexError::NotIdempotent {
            pass: "greek".to_string(),
        };
        assert!(err.to_string().contains("pass 'greek'"));
    }

    #[test]
    fn paper_io_error_carries_path() {
        let err = PaperError::io_error(
            "paper.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("paper.md"));
    }
}
