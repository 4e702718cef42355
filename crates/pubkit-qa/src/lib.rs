//! pubkit i18n/SEO QA suite
//!
//! Checks a deployed multi-locale site: every URL of `urls.json` answers,
//! critical routes carry correct head tags and a clean console, and `/`
//! redirects to a locale.
//!
//! # Core Concepts
//!
//! - [`UrlList`]: paths to check, optionally with text the body must contain
//! - [`CriticalRoutes`]: routes that get the full probe under every locale
//! - [`PageFetcher`] / [`PageProbe`]: plain GETs and full page loads
//! - [`QaSuite`]: runs the checks with bounded concurrency and 429 retry,
//!   producing a [`QaReport`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod checks;
mod error;
mod fetch;
mod head;
mod locale;
mod probe;
mod retry;
mod root;
mod routes;
mod suite;
mod urls;

pub use checks::{
    check_console, check_error_markers, check_expect, check_hreflang, check_html_lang, check_seo, check_status,
    ConsoleFilter, Issue, IssueCategory, IssueCode, DEFAULT_CONSOLE_IGNORE, DEFAULT_ERROR_MARKERS, X_DEFAULT,
};
pub use error::QaError;
pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use head::HeadTags;
pub use locale::{Locale, LocaleSet};
pub use probe::{BrowserCommandProbe, ConsoleLevel, ConsoleMessage, HttpProbe, PageProbe, PageSnapshot};
pub use retry::{fetch_with_retry, RetryPolicy, TOO_MANY_REQUESTS};
pub use root::{check_root_redirect, RootRedirect};
pub use routes::{route_of, screenshot_name, CriticalRoutes};
pub use suite::{QaOptions, QaReport, QaSuite, UrlOutcome, REPORT_FILE};
pub use urls::{resolve_url, UrlEntry, UrlList};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
