//! URL list (`urls.json`)

use crate::error::QaError;
use crate::locale::LocaleSet;
use pubkit_paper::PaperRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One URL to check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlEntry {
    /// Bare path, e.g. `"/en/about"`
    Path(String),
    /// Path with text the body must contain
    Expect {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect: Option<String>,
    },
}

impl UrlEntry {
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Expect { path, .. } => path,
        }
    }

    pub fn expect(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Expect { expect, .. } => expect.as_deref(),
        }
    }
}

/// Ordered, de-duplicated list of URL paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlList {
    entries: Vec<UrlEntry>,
}

impl UrlList {
    /// Build from entries, keeping the first entry for each path
    pub fn new(entries: impl IntoIterator<Item = UrlEntry>) -> Self {
        let mut list = Self::default();
        list.extend(entries);
        list
    }

    /// Parse the JSON array form
    pub fn from_json(path: &Path, json: &str) -> Result<Self, QaError> {
        let entries: Vec<UrlEntry> = serde_json::from_str(json).map_err(|e| QaError::UrlList {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(bad) = entries.iter().find(|e| !e.path().starts_with('/')) {
            return Err(QaError::UrlList {
                path: path.to_path_buf(),
                message: format!("path '{}' must start with '/'", bad.path()),
            });
        }
        Ok(Self::new(entries))
    }

    /// Read `urls.json`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, QaError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| QaError::io_error(path, e))?;
        let list = Self::from_json(path, &json)?;
        tracing::debug!(path = %path.display(), urls = list.len(), "url list loaded");
        Ok(list)
    }

    /// Append paper detail pages for every configured locale
    #[must_use]
    pub fn with_registry_paths(mut self, registry: &PaperRegistry, locales: &LocaleSet) -> Self {
        let codes: Vec<String> = locales.locales().iter().map(ToString::to_string).collect();
        let before = self.len();
        self.extend(registry.detail_paths(&codes).into_iter().map(UrlEntry::Path));
        tracing::debug!(added = self.len() - before, "registry detail pages added");
        self
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = UrlEntry>) {
        let mut seen: HashSet<String> = self.entries.iter().map(|e| e.path().to_string()).collect();
        for entry in entries {
            if seen.insert(entry.path().to_string()) {
                self.entries.push(entry);
            }
        }
    }

    pub fn entries(&self) -> &[UrlEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &UrlEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join `base_url` and an absolute `path`
pub fn resolve_url(base_url: &str, path: &str) -> Result<String, QaError> {
    let base = reqwest::Url::parse(base_url).map_err(|e| QaError::invalid_url(base_url, e))?;
    if base.cannot_be_a_base() {
        return Err(QaError::invalid_url(base_url, "not a base url"));
    }
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    reqwest::Url::parse(&joined)
        .map(String::from)
        .map_err(|e| QaError::invalid_url(joined, e))
}
