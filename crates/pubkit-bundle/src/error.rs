//! Error types for bundle generation

use pubkit_paper::{LatexError, PaperError};
use std::path::PathBuf;

/// Errors while building a submission bundle
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Markdown source could not be read or parsed
    #[error("paper source: {0}")]
    Paper(#[from] PaperError),

    /// Normalizing the generated LaTeX failed
    #[error("normalization: {0}")]
    Latex(#[from] LatexError),

    /// IO error on a bundle file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External tool exited with a failure status
    #[error("{program} exited with {}: {stderr}", exit_label(.status))]
    ToolFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    /// Manifest serialization failed
    #[error("manifest serialization: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl BundleError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn exit_label(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| code.to_string())
}
