//! Plain HTTP page fetches

use crate::error::QaError;
use reqwest::header::{LOCATION, USER_AGENT};
use std::time::Duration;

/// Response of a single GET
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    /// URL after redirects (equal to the request URL when not following)
    pub final_url: String,
    /// `Location` header, present on redirects that were not followed
    pub location: Option<String>,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Fetches pages over HTTP
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, QaError>;
}

/// [`PageFetcher`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Client that follows redirects
    pub fn new(timeout: Duration) -> Result<Self, QaError> {
        Self::build(timeout, reqwest::redirect::Policy::limited(10))
    }

    /// Client that returns 3xx responses as they are
    pub fn without_redirects(timeout: Duration) -> Result<Self, QaError> {
        Self::build(timeout, reqwest::redirect::Policy::none())
    }

    fn build(timeout: Duration, policy: reqwest::redirect::Policy) -> Result<Self, QaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(policy)
            .build()
            .map_err(|source| QaError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, QaError> {
        let http_error = |source| QaError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("pubkit-qa/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(http_error)?;
        tracing::debug!(%url, status, bytes = body.len(), "fetched");
        Ok(FetchedPage {
            status,
            final_url,
            location,
            body,
        })
    }
}
