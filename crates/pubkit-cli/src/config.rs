//! `pubkit.toml`
//!
//! Every section has defaults, so a missing file behaves like an empty one.

use anyhow::{Context, Result};
use pubkit_bundle::SvgConverter;
use pubkit_gate::{GateMode, GatePlan};
use pubkit_paper::latex::LatexOptions;
use pubkit_paper::ReadinessThresholds;
use pubkit_qa::{LocaleSet, QaOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory
pub(crate) const CONFIG_FILE: &str = "pubkit.toml";
/// Overrides `site.base_url`
pub(crate) const BASE_URL_ENV: &str = "PUBKIT_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) site: SiteConfig,
    pub(crate) qa: QaConfig,
    pub(crate) gate: GateConfig,
    pub(crate) paper: PaperConfig,
    pub(crate) bundle: BundleConfig,
    pub(crate) latex: LatexOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SiteConfig {
    pub(crate) base_url: String,
    pub(crate) locales: Vec<String>,
    pub(crate) default_locale: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            locales: vec!["en".to_string()],
            default_locale: "en".to_string(),
        }
    }
}

/// `[qa]`: suite options plus where the URL list and report live.
/// `base_url` is taken from `[site]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct QaConfig {
    pub(crate) urls: PathBuf,
    pub(crate) out_dir: PathBuf,
    /// Append paper detail pages from the registry to the URL list
    pub(crate) include_registry: bool,
    #[serde(flatten)]
    pub(crate) options: QaOptions,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            urls: PathBuf::from("qa/urls.json"),
            out_dir: PathBuf::from("artifacts/qa"),
            include_registry: true,
            options: QaOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GateConfig {
    pub(crate) mode: GateMode,
    pub(crate) out_dir: PathBuf,
    /// Directory the gate commands run in
    pub(crate) workdir: PathBuf,
    /// Ordered steps; the standard eight gates when absent
    pub(crate) steps: Option<GatePlan>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: GateMode::default(),
            out_dir: PathBuf::from("artifacts/release-gate"),
            workdir: PathBuf::from("."),
            steps: None,
        }
    }
}

impl GateConfig {
    pub(crate) fn plan(&self) -> GatePlan {
        self.steps.clone().unwrap_or_else(GatePlan::default_plan)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PaperConfig {
    pub(crate) registry: PathBuf,
    pub(crate) thresholds: ReadinessThresholds,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("content/papers.toml"),
            thresholds: ReadinessThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BundleConfig {
    pub(crate) pandoc: String,
    /// `None` copies SVGs unchanged
    pub(crate) svg_converter: Option<SvgConverter>,
    /// Bundles go to `<out_root>/<venue>/`
    pub(crate) out_root: PathBuf,
    pub(crate) review_dir: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            svg_converter: Some(SvgConverter::default()),
            out_root: PathBuf::from("submission"),
            review_dir: PathBuf::from("review-pdfs"),
        }
    }
}

impl Config {
    /// Load from `explicit` (from `--config` or `PUBKIT_CONFIG`), else
    /// `./pubkit.toml` when present, else defaults; then apply env overrides
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::read(Path::new(CONFIG_FILE))?,
            None => {
                tracing::debug!("no {CONFIG_FILE}, using defaults");
                Self::default()
            }
        };
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                tracing::debug!(%base_url, "base url from {BASE_URL_ENV}");
                config.site.base_url = base_url;
            }
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("invalid config '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub(crate) fn locales(&self) -> Result<LocaleSet> {
        LocaleSet::parse(&self.site.locales, &self.site.default_locale).context("invalid [site] locales")
    }

    /// QA options with the site's base URL, or `base_url` when given
    pub(crate) fn qa_options(&self, base_url: Option<&str>) -> QaOptions {
        QaOptions {
            base_url: base_url.unwrap_or(&self.site.base_url).to_string(),
            ..self.qa.options.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pubkit_gate::GateId;
    use pubkit_paper::latex::Venue;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::default().gate.plan(), GatePlan::default_plan());
    }

    #[test]
    fn parses_all_sections() {
        let config = Config::parse(
            r#"
[site]
base_url = "https://example.org"
locales = ["en", "de", "fr"]
default_locale = "en"

[qa]
urls = "tests/urls.json"
concurrency = 2
console_ignore = ["ResizeObserver loop"]
screenshot_dir = "artifacts/qa/screens"
retry = { max_retries = 5, backoff_ms = 250 }

[qa.browser]
program = "node"
args = ["scripts/probe.mjs", "{url}", "{screenshot}"]

[gate]
mode = "local"

[[gate.steps]]
id = "lint"
action = { kind = "command", program = "npm", args = ["run", "lint"] }

[[gate.steps]]
id = "content"
action = { kind = "builtin" }
timeout_secs = 60

[paper]
registry = "papers.toml"
thresholds = { min_words = 4000 }

[bundle]
pandoc = "/opt/pandoc/bin/pandoc"

[latex]
venue = "ieee"
forbidden_patterns = ["^Draft:"]
"#,
        )
        .unwrap();

        assert_eq!(config.locales().unwrap().locales().len(), 3);
        assert_eq!(config.qa.urls, PathBuf::from("tests/urls.json"));
        assert_eq!(config.qa.options.concurrency, 2);
        assert_eq!(config.qa.options.retry.max_retries, 5);
        assert_eq!(config.qa.options.browser.as_ref().unwrap().program, "node");
        assert_eq!(config.qa_options(None).base_url, "https://example.org");
        assert_eq!(config.qa_options(Some("http://127.0.0.1:4000")).base_url, "http://127.0.0.1:4000");
        assert_eq!(config.gate.mode, GateMode::Local);
        let plan = config.gate.plan();
        assert_eq!(plan.steps().len(), 2);
        assert_eq!(plan.get(GateId::Content).unwrap().timeout_secs, 60);
        assert_eq!(config.paper.thresholds.min_words, 4000);
        assert_eq!(config.paper.thresholds.min_tables, 1);
        assert_eq!(config.latex.venue, Venue::Ieee);
        assert_eq!(config.latex.max_rounds, 4);
    }

    #[test]
    fn rejects_bad_locales_and_duplicate_gates() {
        let config = Config::parse("[site]\nlocales = [\"EN\"]\ndefault_locale = \"EN\"\n").unwrap();
        assert!(config.locales().is_err());
        let dup = "[[gate.steps]]\nid = \"lint\"\naction = { kind = \"builtin\" }\n\
                   [[gate.steps]]\nid = \"lint\"\naction = { kind = \"builtin\" }\n";
        assert!(Config::parse(dup).is_err());
    }
}
