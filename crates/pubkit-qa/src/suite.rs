//! QA suite: checks every URL of the list and the root redirect

use crate::checks::{
    check_console, check_error_markers, check_expect, check_hreflang, check_html_lang, check_seo, check_status,
    ConsoleFilter, Issue, IssueCode, DEFAULT_CONSOLE_IGNORE, DEFAULT_ERROR_MARKERS,
};
use crate::error::QaError;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::head::HeadTags;
use crate::locale::{Locale, LocaleSet};
use crate::probe::{BrowserCommandProbe, HttpProbe, PageProbe};
use crate::retry::{fetch_with_retry, retry_throttled, RetryPolicy};
use crate::root::{check_root_redirect, RootRedirect};
use crate::routes::{screenshot_name, CriticalRoutes};
use crate::urls::{resolve_url, UrlEntry, UrlList};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Report file name
pub const REPORT_FILE: &str = "qa-report.json";

/// Suite settings (`[qa]` in `pubkit.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaOptions {
    pub base_url: String,
    /// Origin expected in canonical links when it differs from `base_url`
    pub canonical_base: Option<String>,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub critical_routes: CriticalRoutes,
    /// Regexes for console errors to disregard
    pub console_ignore: Vec<String>,
    pub error_markers: Vec<String>,
    pub screenshot_dir: Option<PathBuf>,
    /// Headless browser used for critical routes; plain HTTP when unset
    pub browser: Option<BrowserCommandProbe>,
    pub timeout_secs: u64,
    pub check_root: bool,
}

impl Default for QaOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            canonical_base: None,
            concurrency: 4,
            retry: RetryPolicy::default(),
            critical_routes: CriticalRoutes::default(),
            console_ignore: DEFAULT_CONSOLE_IGNORE.iter().map(ToString::to_string).collect(),
            error_markers: DEFAULT_ERROR_MARKERS.iter().map(ToString::to_string).collect(),
            screenshot_dir: None,
            browser: None,
            timeout_secs: 30,
            check_root: true,
        }
    }
}

/// Result for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlOutcome {
    pub url: String,
    pub path: String,
    pub critical: bool,
    /// Last HTTP status, `None` when no response arrived
    pub status: Option<u16>,
    pub attempts: u32,
    pub issues: Vec<Issue>,
    pub screenshot: Option<PathBuf>,
    pub duration_ms: u64,
}

impl UrlOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaReport {
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub root: Option<RootRedirect>,
    /// Sorted by URL
    pub outcomes: Vec<UrlOutcome>,
    pub passed: bool,
}

impl QaReport {
    pub fn failures(&self) -> impl Iterator<Item = &UrlOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    /// Issues across the root check and all URLs
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.issues.len()) + self.outcomes.iter().map(|o| o.issues.len()).sum::<usize>()
    }

    /// One line per issue, `<url>: <message>`
    #[must_use]
    pub fn issue_lines(&self) -> Vec<String> {
        let root = self
            .root
            .iter()
            .flat_map(|r| r.issues.iter().map(move |i| format!("{}: {}", r.url, i.message)));
        let urls = self
            .outcomes
            .iter()
            .flat_map(|o| o.issues.iter().map(move |i| format!("{}: {}", o.url, i.message)));
        root.chain(urls).collect()
    }

    /// Write `qa-report.json` into `dir`
    pub async fn write(&self, dir: &Path) -> Result<PathBuf, QaError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| QaError::io_error(dir, e))?;
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| QaError::io_error(&path, e))?;
        tracing::info!(path = %path.display(), "qa report written");
        Ok(path)
    }
}

/// Runs the QA checks against a deployed site
pub struct QaSuite {
    options: QaOptions,
    locales: LocaleSet,
    console: ConsoleFilter,
    fetcher: Arc<dyn PageFetcher>,
    root_fetcher: Arc<dyn PageFetcher>,
    probe: Arc<dyn PageProbe>,
}

impl std::fmt::Debug for QaSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaSuite")
            .field("options", &self.options)
            .field("locales", &self.locales)
            .finish_non_exhaustive()
    }
}

impl QaSuite {
    /// Suite using `reqwest` and, when configured, the browser command
    pub fn new(options: QaOptions, locales: LocaleSet) -> Result<Self, QaError> {
        let timeout = Duration::from_secs(options.timeout_secs);
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(timeout)?);
        let root_fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::without_redirects(timeout)?);
        let probe: Arc<dyn PageProbe> = match &options.browser {
            Some(browser) => Arc::new(browser.clone()),
            None => Arc::new(HttpProbe::new(Arc::clone(&fetcher))),
        };
        Ok(Self {
            console: ConsoleFilter::new(&options.console_ignore)?,
            options,
            locales,
            fetcher,
            root_fetcher,
            probe,
        })
    }

    /// Replace the fetcher used for light checks and the root redirect
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.root_fetcher = Arc::clone(&fetcher);
        self.fetcher = fetcher;
        self
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn PageProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn options(&self) -> &QaOptions {
        &self.options
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    /// Check every URL with bounded concurrency, plus `/` when enabled
    pub async fn run(&self, urls: &UrlList) -> QaReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(base_url = %self.options.base_url, urls = urls.len(), "qa run started");

        let root = if self.options.check_root {
            Some(self.root().await)
        } else {
            None
        };

        let checks: Vec<_> = urls.iter().map(|entry| self.check_entry(entry)).collect();
        let mut outcomes: Vec<UrlOutcome> = stream::iter(checks)
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.url.cmp(&b.url));

        let passed = root.as_ref().map_or(true, RootRedirect::passed) && outcomes.iter().all(UrlOutcome::passed);
        let report = QaReport {
            base_url: self.options.base_url.clone(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: elapsed_ms(clock),
            root,
            outcomes,
            passed,
        };
        tracing::info!(passed, issues = report.issue_count(), duration_ms = report.duration_ms, "qa run finished");
        report
    }

    /// Root redirect check; transport failures become an issue
    pub async fn root(&self) -> RootRedirect {
        match check_root_redirect(self.root_fetcher.as_ref(), &self.options.base_url).await {
            Ok(root) => root,
            Err(e) => {
                tracing::error!(error = %e, "root redirect check failed");
                RootRedirect {
                    url: resolve_url(&self.options.base_url, "/").unwrap_or_else(|_| self.options.base_url.clone()),
                    status: 0,
                    location: None,
                    locale: None,
                    issues: vec![Issue::new(IssueCode::Fetch, e.to_string())],
                }
            }
        }
    }

    async fn check_entry(&self, entry: &UrlEntry) -> UrlOutcome {
        let path = entry.path();
        let critical = self.options.critical_routes.is_critical(path, &self.locales);
        let clock = Instant::now();
        let mut outcome = UrlOutcome {
            url: path.to_string(),
            path: path.to_string(),
            critical,
            status: None,
            attempts: 0,
            issues: Vec::new(),
            screenshot: None,
            duration_ms: 0,
        };

        let result = match resolve_url(&self.options.base_url, path) {
            Ok(url) => {
                outcome.url.clone_from(&url);
                if critical {
                    self.check_critical(&url, entry, &mut outcome).await
                } else {
                    self.check_light(&url, entry, &mut outcome).await
                }
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            outcome.issues.push(Issue::new(IssueCode::Fetch, e.to_string()));
        }
        outcome.duration_ms = elapsed_ms(clock);

        if outcome.passed() {
            tracing::debug!(url = %outcome.url, critical, "url passed");
        } else {
            tracing::warn!(url = %outcome.url, critical, issues = outcome.issues.len(), "url failed");
        }
        outcome
    }

    async fn check_light(&self, url: &str, entry: &UrlEntry, outcome: &mut UrlOutcome) -> Result<(), QaError> {
        let (page, attempts) = fetch_with_retry(self.fetcher.as_ref(), url, &self.options.retry).await?;
        outcome.status = Some(page.status);
        outcome.attempts = attempts;
        outcome.issues.extend(check_status(page.status));
        outcome.issues.extend(check_expect(&page.body, entry.expect()));
        outcome
            .issues
            .extend(check_error_markers(&page.body, &self.options.error_markers));
        Ok(())
    }

    async fn check_critical(&self, url: &str, entry: &UrlEntry, outcome: &mut UrlOutcome) -> Result<(), QaError> {
        let locale = self.locales.locale_of(entry.path());
        let screenshot = self.screenshot_path(locale, entry.path()).await?;

        let probe = Arc::clone(&self.probe);
        let (snapshot, attempts) = retry_throttled(
            url,
            &self.options.retry,
            || {
                let probe = Arc::clone(&probe);
                let screenshot = screenshot.clone();
                async move { probe.load(url, screenshot.as_deref()).await }
            },
            |s| s.status,
        )
        .await?;
        outcome.status = Some(snapshot.status);
        outcome.attempts = attempts;
        outcome.screenshot.clone_from(&snapshot.screenshot);

        let issues = &mut outcome.issues;
        issues.extend(check_status(snapshot.status));
        issues.extend(check_expect(&snapshot.html, entry.expect()));
        issues.extend(check_error_markers(&snapshot.html, &self.options.error_markers));
        issues.extend(check_console(&snapshot.console, &self.console));

        let tags = HeadTags::parse(&snapshot.html);
        issues.extend(check_html_lang(&tags, locale));
        let canonical_base = self.options.canonical_base.as_deref().unwrap_or(&self.options.base_url);
        issues.extend(check_seo(&tags, &resolve_url(canonical_base, entry.path())?));
        issues.extend(check_hreflang(&tags, &self.locales));

        if screenshot.is_some() && snapshot.screenshot.is_none() {
            tracing::warn!(%url, "probe did not write the requested screenshot");
        }
        Ok(())
    }

    async fn screenshot_path(&self, locale: Option<Locale>, path: &str) -> Result<Option<PathBuf>, QaError> {
        let Some(dir) = self.options.screenshot_dir.as_ref() else {
            return Ok(None);
        };
        if !self.probe.captures_screenshots() {
            return Ok(None);
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| QaError::io_error(dir, e))?;
        Ok(Some(dir.join(screenshot_name(locale, path))))
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedPage;
    use crate::probe::{ConsoleMessage, PageSnapshot};
    use std::collections::HashMap;

    /// Serves canned pages by URL
    struct Site {
        pages: HashMap<String, (u16, String)>,
        console: Vec<ConsoleMessage>,
    }

    impl Site {
        fn new() -> Self {
            let mut pages = HashMap::new();
            for lang in ["en", "de"] {
                pages.insert(
                    format!("https://example.org/{lang}"),
                    (200, pubkit_test_utils::localized_page(lang, "", &["en", "de"])),
                );
            }
            pages.insert("https://example.org/en/blog".into(), (200, "<p>Blog</p>".into()));
            Self {
                pages,
                console: Vec::new(),
            }
        }

        fn answer(&self, url: &str) -> (u16, String) {
            self.pages.get(url).cloned().unwrap_or((404, "This page could not be found".into()))
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for Site {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, QaError> {
            if url == "https://example.org/" {
                return Ok(FetchedPage {
                    status: 307,
                    final_url: url.into(),
                    location: Some("/en".into()),
                    body: String::new(),
                });
            }
            let (status, body) = self.answer(url);
            Ok(FetchedPage {
                status,
                final_url: url.into(),
                location: None,
                body,
            })
        }
    }

    #[async_trait::async_trait]
    impl PageProbe for Site {
        async fn load(&self, url: &str, _screenshot: Option<&Path>) -> Result<PageSnapshot, QaError> {
            let (status, html) = self.answer(url);
            Ok(PageSnapshot {
                status,
                html,
                console: self.console.clone(),
                screenshot: None,
            })
        }
    }

    fn suite(site: Site) -> QaSuite {
        let site = Arc::new(site);
        let options = QaOptions {
            base_url: "https://example.org".into(),
            ..QaOptions::default()
        };
        QaSuite::new(options, LocaleSet::parse(&["en", "de"], "en").unwrap())
            .unwrap()
            .with_fetcher(site.clone())
            .with_probe(site)
    }

    fn list(paths: &[&str]) -> UrlList {
        UrlList::new(paths.iter().map(|p| UrlEntry::Path((*p).to_string())))
    }

    #[tokio::test]
    async fn healthy_site_passes() {
        let report = suite(Site::new()).run(&list(&["/en", "/de", "/en/blog"])).await;
        assert!(report.passed, "{:?}", report.issue_lines());
        let urls: Vec<&str> = report.outcomes.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://example.org/de", "https://example.org/en", "https://example.org/en/blog"]
        );
        assert!(report.outcomes[0].critical);
        assert!(!report.outcomes[2].critical);
        assert_eq!(report.root.as_ref().unwrap().location.as_deref(), Some("/en"));
    }

    #[tokio::test]
    async fn console_errors_fail_critical_routes_only() {
        let mut site = Site::new();
        site.console = vec![
            ConsoleMessage::error("Download the React DevTools for a better experience"),
            ConsoleMessage::error("Hydration failed"),
        ];
        let report = suite(site).run(&list(&["/en", "/en/blog"])).await;
        assert!(!report.passed);
        let en = &report.outcomes[0];
        assert_eq!(en.issues.len(), 1);
        assert_eq!(en.issues[0].code, IssueCode::ConsoleError);
        assert!(report.outcomes[1].passed());
    }

    #[tokio::test]
    async fn wrong_lang_and_missing_pages_are_reported() {
        let mut site = Site::new();
        site.pages.insert(
            "https://example.org/de".into(),
            (200, pubkit_test_utils::localized_page("en", "", &["en", "de"])),
        );
        let report = suite(site).run(&list(&["/de", "/en/missing"])).await;
        let de = &report.outcomes[0];
        assert!(de.issues.iter().any(|i| i.code == IssueCode::HtmlLang));
        assert!(de.issues.iter().any(|i| i.code == IssueCode::Canonical));
        let missing = &report.outcomes[1];
        assert_eq!(missing.status, Some(404));
        let codes: Vec<IssueCode> = missing.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, [IssueCode::Status, IssueCode::ErrorUi]);
    }
}
