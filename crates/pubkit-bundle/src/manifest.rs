//! Bundle manifest and README

use crate::error::BundleError;
use crate::figures::FigureRecord;
use chrono::{DateTime, Utc};
use pubkit_paper::latex::Venue;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Manifest file name inside the bundle
pub const MANIFEST_FILE: &str = "manifest.json";
/// README file name inside the bundle
pub const README_FILE: &str = "README.md";
/// Generated LaTeX file name inside the bundle
pub const MAIN_TEX: &str = "main.tex";

/// Description of a generated bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub title: String,
    pub venue: Venue,
    pub main_tex: String,
    /// SHA-256 of `main.tex` after path rewriting and normalization
    pub main_tex_sha256: String,
    pub normalized: bool,
    pub figures: Vec<FigureRecord>,
    /// Image references that could not be found
    pub missing: Vec<String>,
    pub readme: String,
    pub review_pdf: Option<PathBuf>,
    pub generated_at: DateTime<Utc>,
}

impl BundleManifest {
    /// Write `manifest.json` into `dir`
    pub async fn write(&self, dir: &Path) -> Result<PathBuf, BundleError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| BundleError::io_error(&path, e))?;
        Ok(path)
    }

    /// Read a previously written manifest
    pub async fn read(dir: &Path) -> Result<Self, BundleError> {
        let path = dir.join(MANIFEST_FILE);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BundleError::io_error(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// README contents for the bundle
    #[must_use]
    pub fn render_readme(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(out, "Submission bundle for **{}**.\n", self.venue);
        out.push_str("## Files\n\n");
        let _ = writeln!(out, "- `{}`: main LaTeX source", self.main_tex);
        for figure in &self.figures {
            let note = if figure.converted { " (converted from SVG)" } else { "" };
            let _ = writeln!(out, "- `{}`{note}", figure.dest);
        }
        if !self.missing.is_empty() {
            out.push_str("\n## Missing figures\n\n");
            for missing in &self.missing {
                let _ = writeln!(out, "- `{missing}`");
            }
        }
        out.push_str("\n## Build\n\n```sh\n");
        let _ = writeln!(out, "latexmk -pdf {}", self.main_tex);
        out.push_str("# or\n");
        let _ = writeln!(out, "pdflatex {0} && pdflatex {0}", self.main_tex);
        out.push_str("```\n");
        out
    }
}

/// Hex SHA-256 of a byte slice
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> BundleManifest {
        BundleManifest {
            title: "Adaptive Edge Caching".to_string(),
            venue: Venue::Arxiv,
            main_tex: MAIN_TEX.to_string(),
            main_tex_sha256: sha256_hex(b""),
            normalized: true,
            figures: vec![FigureRecord {
                source: "img/arch.svg".to_string(),
                dest: "figures/arch.png".to_string(),
                sha256: sha256_hex(b"png"),
                converted: true,
            }],
            missing: vec!["img/gone.png".to_string()],
            readme: README_FILE.to_string(),
            review_pdf: None,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn readme_lists_files_and_build_commands() {
        let readme = manifest().render_readme();
        assert!(readme.starts_with("# Adaptive Edge Caching\n"));
        assert!(readme.contains("Submission bundle for **arxiv**."));
        assert!(readme.contains("- `figures/arch.png` (converted from SVG)"));
        assert!(readme.contains("## Missing figures\n\n- `img/gone.png`"));
        assert!(readme.contains("latexmk -pdf main.tex"));
    }

    #[tokio::test]
    async fn manifest_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let original = manifest();
        original.write(dir.path()).await.unwrap();
        let loaded = BundleManifest::read(dir.path()).await.unwrap();
        assert_eq!(loaded, original);
    }
}
