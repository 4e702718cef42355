//! Root redirect check: `/` must send visitors to a locale

use crate::checks::{path_of, Issue, IssueCode};
use crate::error::QaError;
use crate::fetch::PageFetcher;
use crate::locale::Locale;
use crate::urls::resolve_url;
use serde::{Deserialize, Serialize};

/// What `/` answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRedirect {
    pub url: String,
    pub status: u16,
    pub location: Option<String>,
    /// Locale the redirect points to
    pub locale: Option<Locale>,
    pub issues: Vec<Issue>,
}

impl RootRedirect {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Request `/` without following redirects and inspect the answer.
///
/// `fetcher` must not follow redirects, otherwise the 3xx is never seen.
pub async fn check_root_redirect(fetcher: &dyn PageFetcher, base_url: &str) -> Result<RootRedirect, QaError> {
    let url = resolve_url(base_url, "/")?;
    let page = fetcher.fetch(&url).await?;
    let locale = page
        .location
        .as_deref()
        .and_then(|location| Locale::from_path(&path_of(location)));

    let mut issues = Vec::new();
    if !page.is_redirect() {
        issues.push(Issue::new(
            IssueCode::RootRedirect,
            format!("expected a redirect from /, got status {}", page.status),
        ));
    } else if locale.is_none() {
        issues.push(Issue::new(
            IssueCode::RootRedirect,
            format!(
                "redirect target '{}' has no locale prefix",
                page.location.as_deref().unwrap_or_default()
            ),
        ));
    }
    tracing::info!(%url, status = page.status, location = ?page.location, passed = issues.is_empty(), "root redirect checked");

    Ok(RootRedirect {
        url,
        status: page.status,
        location: page.location,
        locale,
        issues,
    })
}
