//! Retry on HTTP 429

use crate::error::QaError;
use crate::fetch::{FetchedPage, PageFetcher};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Status that triggers a retry
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Linear backoff: after the n-th throttled attempt wait `backoff_ms * n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts after the first
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Fetch `url`, retrying only while the server answers 429.
///
/// Returns the last response and the number of attempts made. Transport
/// errors are not retried.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<(FetchedPage, u32), QaError> {
    retry_throttled(url, policy, || fetcher.fetch(url), |page| page.status).await
}

/// Run `op` until `status_of` its result is not 429 or the retries run out
pub(crate) async fn retry_throttled<T, F, Fut>(
    url: &str,
    policy: &RetryPolicy,
    mut op: F,
    status_of: impl Fn(&T) -> u16,
) -> Result<(T, u32), QaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, QaError>>,
{
    let mut attempt = 1;
    loop {
        let value = op().await?;
        if status_of(&value) != TOO_MANY_REQUESTS || attempt > policy.max_retries {
            return Ok((value, attempt));
        }
        let delay = policy.delay_for(attempt);
        tracing::warn!(%url, attempt, ?delay, "throttled, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
