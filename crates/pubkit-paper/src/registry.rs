//! Static paper registry
//!
//! The research section renders one detail page per registered paper. The
//! registry is a flat list loaded from `papers.toml` (`[[paper]]` tables) or
//! a JSON array, validated once at load time.

use crate::error::RegistryError;
use crate::latex::Venue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

static SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex"));

/// Metadata for one paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperEntry {
    /// Stable identifier
    pub id: String,
    /// URL slug for the detail page
    pub slug: String,
    /// Display title
    pub title: String,
    /// Keywords shown on the detail page
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Markdown source, relative to the registry file
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Target venue for the camera-ready version
    #[serde(default)]
    pub venue: Option<Venue>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "paper")]
    papers: Vec<PaperEntry>,
}

/// Validated paper registry
#[derive(Debug, Clone, Default)]
pub struct PaperRegistry {
    entries: Vec<PaperEntry>,
    root: Option<PathBuf>,
}

impl PaperRegistry {
    /// Build a registry, rejecting duplicate ids/slugs, bad slugs and empty titles
    pub fn from_entries(entries: Vec<PaperEntry>) -> Result<Self, RegistryError> {
        let mut ids = HashSet::new();
        let mut slugs = HashSet::new();
        for entry in &entries {
            if !ids.insert(entry.id.as_str()) {
                return Err(RegistryError::DuplicateId(entry.id.clone()));
            }
            if !SLUG.is_match(&entry.slug) {
                return Err(RegistryError::InvalidSlug(entry.slug.clone()));
            }
            if !slugs.insert(entry.slug.as_str()) {
                return Err(RegistryError::DuplicateSlug(entry.slug.clone()));
            }
            if entry.title.trim().is_empty() {
                return Err(RegistryError::EmptyTitle(entry.id.clone()));
            }
        }
        Ok(Self {
            entries,
            root: None,
        })
    }

    /// Load from a `.toml` or `.json` file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let format_error = |message: String| RegistryError::Format {
            path: path.to_path_buf(),
            message,
        };

        let entries = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str::<Vec<PaperEntry>>(&text)
                .map_err(|e| format_error(e.to_string()))?,
            _ => {
                toml::from_str::<RegistryFile>(&text)
                    .map_err(|e| format_error(e.to_string()))?
                    .papers
            }
        };

        let mut registry = Self::from_entries(entries)?;
        registry.root = path.parent().map(Path::to_path_buf);
        tracing::debug!(papers = registry.len(), path = %path.display(), "loaded paper registry");
        Ok(registry)
    }

    /// Look up by id
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&PaperEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Look up by slug
    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&PaperEntry> {
        self.entries.iter().find(|e| e.slug == slug)
    }

    /// Entries in registry order
    pub fn iter(&self) -> impl Iterator<Item = &PaperEntry> {
        self.entries.iter()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source path of an entry, resolved against the registry file's directory
    #[must_use]
    pub fn source_path(&self, entry: &PaperEntry) -> Option<PathBuf> {
        let source = entry.source.as_ref()?;
        Some(match &self.root {
            Some(root) if source.is_relative() => root.join(source),
            _ => source.clone(),
        })
    }

    /// Detail page paths (`/{locale}/research/{slug}`) for every locale and paper
    #[must_use]
    pub fn detail_paths<S: AsRef<str>>(&self, locales: &[S]) -> Vec<String> {
        locales
            .iter()
            .flat_map(|locale| {
                self.entries
                    .iter()
                    .map(move |e| format!("/{}/research/{}", locale.as_ref(), e.slug))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, slug: &str) -> PaperEntry {
        PaperEntry {
            id: id.to_string(),
            slug: slug.to_string(),
            title: format!("Paper {id}"),
            keywords: Vec::new(),
            source: None,
            venue: None,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = PaperRegistry::from_entries(vec![entry("p1", "a"), entry("p1", "b")]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "p1"));
    }

    #[test]
    fn rejects_duplicate_slugs() {
        let err = PaperRegistry::from_entries(vec![entry("p1", "a"), entry("p2", "a")]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSlug(_)));
    }

    #[test]
    fn rejects_bad_slug() {
        for slug in ["Upper", "trailing-", "two--dashes", "with space", ""] {
            let err = PaperRegistry::from_entries(vec![entry("p1", slug)]).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidSlug(_)), "{slug}");
        }
    }

    #[test]
    fn lookups_and_detail_paths() {
        let registry =
            PaperRegistry::from_entries(vec![entry("p1", "event-sourcing"), entry("p2", "crdt-sync")])
                .unwrap();
        assert_eq!(registry.by_slug("crdt-sync").unwrap().id, "p2");
        assert_eq!(registry.by_id("p1").unwrap().slug, "event-sourcing");
        assert!(registry.by_id("nope").is_none());

        let paths = registry.detail_paths(&["en", "de"]);
        assert_eq!(
            paths,
            vec![
                "/en/research/event-sourcing",
                "/en/research/crdt-sync",
                "/de/research/event-sourcing",
                "/de/research/crdt-sync",
            ]
        );
    }

    #[tokio::test]
    async fn load_toml_resolves_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.toml");
        std::fs::write(
            &path,
            r#"
[[paper]]
id = "p1"
slug = "event-sourcing"
title = "Event Sourcing at Scale"
keywords = ["events"]
source = "papers/event-sourcing.md"
venue = "acm"
"#,
        )
        .unwrap();

        let registry = PaperRegistry::load(&path).await.unwrap();
        let entry = registry.by_id("p1").unwrap();
        assert_eq!(entry.venue, Some(Venue::Acm));
        assert_eq!(
            registry.source_path(entry).unwrap(),
            dir.path().join("papers/event-sourcing.md")
        );
    }

    #[tokio::test]
    async fn load_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.json");
        std::fs::write(&path, r#"[{"id":"p1","slug":"a","title":"A"}]"#).unwrap();
        let registry = PaperRegistry::load(&path).await.unwrap();
        assert_eq!(registry.len(), 1);
    }
}
