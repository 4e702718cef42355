//! Error types for the QA suite
//!
//! Failed checks are not errors: they are reported as issues on the URL's
//! outcome. These errors cover configuration problems and transport failures.

use std::path::PathBuf;

/// Errors raised by the QA suite
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// Locale is not two lowercase ASCII letters
    #[error("invalid locale '{0}': expected two lowercase letters")]
    InvalidLocale(String),

    /// Default locale is not among the configured locales
    #[error("default locale '{0}' is not in the locale list")]
    UnknownDefaultLocale(String),

    /// Base URL or path could not be turned into a URL
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Request failed before a response arrived
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Browser probe failed or printed something unreadable
    #[error("probe for {url} failed: {message}")]
    Probe { url: String, message: String },

    /// `urls.json` is malformed
    #[error("invalid url list {path}: {message}")]
    UrlList { path: PathBuf, message: String },

    /// Console ignore pattern is not a valid regex
    #[error("invalid console ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// IO error
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report serialization failed
    #[error("report serialization: {0}")]
    Json(#[from] serde_json::Error),
}

impl QaError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_url(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }
}
