//! Error types for the release gate

use crate::plan::GateId;
use std::path::PathBuf;

/// Errors raised while planning or running gates
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Plan lists the same gate twice
    #[error("gate '{0}' appears more than once in the plan")]
    DuplicateGate(GateId),

    /// Unknown gate name
    #[error("unknown gate: {0}")]
    UnknownGate(String),

    /// Unknown mode name
    #[error("unknown gate mode '{0}': expected ci or local")]
    UnknownMode(String),

    /// Command could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A builtin check could not complete
    #[error("{gate} check failed to run: {message}")]
    Check { gate: GateId, message: String },

    /// IO error writing the summary
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Summary serialization failed
    #[error("summary serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a check error for a gate
    pub fn check(gate: GateId, message: impl Into<String>) -> Self {
        Self::Check {
            gate,
            message: message.into(),
        }
    }
}
