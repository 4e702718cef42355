//! Figure collection: flattened names, SVG conversion, LaTeX path rewriting

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

static INCLUDEGRAPHICS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\includegraphics\s*(?:\[[^\]]*\])?\s*\{)([^}]*)(\})").expect("includegraphics regex")
});

/// SVG to PNG converter invocation
///
/// `{input}` and `{output}` in `args` are replaced with the file paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgConverter {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for SvgConverter {
    fn default() -> Self {
        Self {
            program: "rsvg-convert".to_string(),
            args: ["-f", "png", "-o", "{output}", "{input}"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl SvgConverter {
    /// Arguments with placeholders filled in
    #[must_use]
    pub fn args_for(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

/// One figure copied into the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureRecord {
    /// Path as written in the Markdown source
    pub source: String,
    /// Path inside the bundle (`figures/<name>`)
    pub dest: String,
    /// SHA-256 of the bundled file
    pub sha256: String,
    /// Whether the file was converted from SVG
    pub converted: bool,
}

/// Hands out unique flat file names inside `figures/`
#[derive(Debug, Default)]
pub(crate) struct FigureNamer {
    taken: HashSet<String>,
}

impl FigureNamer {
    /// `name`, or `stem-N.ext` for the first free N
    pub(crate) fn assign(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_string()) {
            return name.to_string();
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };
        (1..)
            .map(|n| match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            })
            .find(|candidate| self.taken.insert(candidate.clone()))
            .unwrap_or_default()
    }
}

/// Whether a path names an SVG file
#[must_use]
pub fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Point every `\includegraphics` at its bundled copy
///
/// Sources that were not bundled keep their original path. Paths that
/// already point into `figures/` are left alone.
#[must_use]
pub fn rewrite_graphics_paths(latex: &str, figures: &[FigureRecord]) -> String {
    let by_source: HashMap<&str, &str> = figures
        .iter()
        .map(|f| (f.source.as_str(), f.dest.as_str()))
        .collect();
    INCLUDEGRAPHICS
        .replace_all(latex, |caps: &Captures<'_>| {
            let path = caps[2].trim();
            let lookup = path.strip_prefix("./").unwrap_or(path);
            let dest = by_source
                .get(path)
                .or_else(|| by_source.get(lookup))
                .copied()
                .unwrap_or(path);
            format!("{}{dest}{}", &caps[1], &caps[3])
        })
        .into_owned()
}
