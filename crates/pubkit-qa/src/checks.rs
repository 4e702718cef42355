//! Page checks
//!
//! Each check is a pure function over what was fetched; failures become
//! [`Issue`]s on the URL's outcome.

use crate::error::QaError;
use crate::head::HeadTags;
use crate::locale::{Locale, LocaleSet};
use crate::probe::{ConsoleLevel, ConsoleMessage};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hreflang value pointing at the fallback page
pub const X_DEFAULT: &str = "x-default";

/// Texts that only appear when the site renders its error UI
pub const DEFAULT_ERROR_MARKERS: [&str; 3] = [
    "Application error: a client-side exception has occurred",
    "Internal Server Error",
    "This page could not be found",
];

/// Console messages that are noise in development builds
pub const DEFAULT_CONSOLE_IGNORE: [&str; 2] = ["Download the React DevTools", "favicon\\.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Request could not be made
    Fetch,
    Status,
    MissingText,
    ErrorUi,
    ConsoleError,
    HtmlLang,
    MissingTitle,
    MissingDescription,
    Canonical,
    MissingHreflang,
    HreflangMismatch,
    RootRedirect,
    Screenshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Availability,
    Seo,
    I18n,
    Console,
}

impl IssueCode {
    #[must_use]
    pub const fn category(self) -> IssueCategory {
        match self {
            Self::Fetch | Self::Status | Self::MissingText | Self::ErrorUi | Self::Screenshot => {
                IssueCategory::Availability
            }
            Self::ConsoleError => IssueCategory::Console,
            Self::MissingTitle | Self::MissingDescription | Self::Canonical => IssueCategory::Seo,
            Self::HtmlLang | Self::MissingHreflang | Self::HreflangMismatch | Self::RootRedirect => {
                IssueCategory::I18n
            }
        }
    }
}

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> IssueCategory {
        self.code.category()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

pub fn check_status(status: u16) -> Option<Issue> {
    (status != 200).then(|| Issue::new(IssueCode::Status, format!("expected status 200, got {status}")))
}

pub fn check_expect(body: &str, expect: Option<&str>) -> Option<Issue> {
    let expect = expect?;
    (!body.contains(expect)).then(|| Issue::new(IssueCode::MissingText, format!("body does not contain '{expect}'")))
}

pub fn check_error_markers<S: AsRef<str>>(html: &str, markers: &[S]) -> Vec<Issue> {
    markers
        .iter()
        .map(AsRef::as_ref)
        .filter(|m| !m.is_empty() && html.contains(m))
        .map(|m| Issue::new(IssueCode::ErrorUi, format!("error UI rendered: '{m}'")))
        .collect()
}

/// Compiled console ignore list
#[derive(Debug, Clone, Default)]
pub struct ConsoleFilter {
    ignore: Vec<Regex>,
}

impl ConsoleFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, QaError> {
        let ignore = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| QaError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { ignore })
    }

    #[must_use]
    pub fn is_ignored(&self, text: &str) -> bool {
        self.ignore.iter().any(|re| re.is_match(text))
    }

    /// Console errors not covered by the ignore list
    pub fn errors<'a>(&'a self, console: &'a [ConsoleMessage]) -> impl Iterator<Item = &'a ConsoleMessage> {
        console
            .iter()
            .filter(move |m| m.level == ConsoleLevel::Error && !self.is_ignored(&m.text))
    }
}

pub fn check_console(console: &[ConsoleMessage], filter: &ConsoleFilter) -> Vec<Issue> {
    filter
        .errors(console)
        .map(|m| Issue::new(IssueCode::ConsoleError, format!("console error: {}", m.text)))
        .collect()
}

/// `<html lang>` must equal the URL's locale segment
pub fn check_html_lang(tags: &HeadTags, expected: Option<Locale>) -> Option<Issue> {
    let Some(expected) = expected else {
        return Some(Issue::new(IssueCode::HtmlLang, "url has no locale segment"));
    };
    match tags.lang.as_deref() {
        Some(lang) if lang == expected.as_str() => None,
        Some(lang) => Some(Issue::new(
            IssueCode::HtmlLang,
            format!("html lang is '{lang}', expected '{expected}'"),
        )),
        None => Some(Issue::new(IssueCode::HtmlLang, format!("html lang missing, expected '{expected}'"))),
    }
}

/// Title, description and canonical
pub fn check_seo(tags: &HeadTags, expected_canonical: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    if tags.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        issues.push(Issue::new(IssueCode::MissingTitle, "title is missing or empty"));
    }
    if tags.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        issues.push(Issue::new(IssueCode::MissingDescription, "meta description is missing"));
    }
    match tags.canonical.as_deref() {
        Some(canonical) if same_url(canonical, expected_canonical) => {}
        Some(canonical) => issues.push(Issue::new(
            IssueCode::Canonical,
            format!("canonical is '{canonical}', expected '{expected_canonical}'"),
        )),
        None => issues.push(Issue::new(IssueCode::Canonical, "canonical link is missing")),
    }
    issues
}

/// Every locale and `x-default` present; each alternate points at its own locale
pub fn check_hreflang(tags: &HeadTags, locales: &LocaleSet) -> Vec<Issue> {
    let mut issues = Vec::new();
    let required = locales
        .locales()
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once(X_DEFAULT.to_string()));
    for hreflang in required {
        if !tags.alternates.contains_key(&hreflang) {
            issues.push(Issue::new(IssueCode::MissingHreflang, format!("hreflang '{hreflang}' is missing")));
        }
    }
    for (hreflang, href) in &tags.alternates {
        if hreflang == X_DEFAULT {
            continue;
        }
        let path_locale = Locale::from_path(&path_of(href));
        if path_locale.map(|l| l.to_string()).as_deref() != Some(hreflang.as_str()) {
            issues.push(Issue::new(
                IssueCode::HreflangMismatch,
                format!("hreflang '{hreflang}' points to '{href}'"),
            ));
        }
    }
    issues
}

/// Path part of an absolute or root-relative URL
pub(crate) fn path_of(href: &str) -> String {
    match reqwest::Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}
