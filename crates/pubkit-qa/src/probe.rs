//! Full page loads: status, rendered HTML, console messages, screenshot

use crate::error::QaError;
use crate::fetch::PageFetcher;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Error,
    Warning,
    Info,
    Log,
    Debug,
    #[serde(other)]
    Other,
}

/// One browser console message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

impl ConsoleMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: ConsoleLevel::Error,
            text: text.into(),
        }
    }
}

/// What a probe saw when loading a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub status: u16,
    pub html: String,
    #[serde(default)]
    pub console: Vec<ConsoleMessage>,
    /// Screenshot written by the probe, if any
    #[serde(default)]
    pub screenshot: Option<PathBuf>,
}

/// Loads a page the way a visitor would
#[async_trait::async_trait]
pub trait PageProbe: Send + Sync {
    /// Load `url`, saving a screenshot to `screenshot` when given and supported
    async fn load(&self, url: &str, screenshot: Option<&Path>) -> Result<PageSnapshot, QaError>;

    /// Whether [`PageProbe::load`] can write screenshots
    fn captures_screenshots(&self) -> bool {
        false
    }
}

/// Probe that only fetches HTML; no scripts run so the console stays empty
#[derive(Clone)]
pub struct HttpProbe {
    fetcher: Arc<dyn PageFetcher>,
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProbe").finish_non_exhaustive()
    }
}

impl HttpProbe {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl PageProbe for HttpProbe {
    async fn load(&self, url: &str, _screenshot: Option<&Path>) -> Result<PageSnapshot, QaError> {
        let page = self.fetcher.fetch(url).await?;
        Ok(PageSnapshot {
            status: page.status,
            html: page.body,
            console: Vec::new(),
            screenshot: None,
        })
    }
}

/// Probe delegating to an external headless-browser command.
///
/// `{url}` and `{screenshot}` in the arguments are replaced before the
/// command runs. The command prints a [`PageSnapshot`] as JSON on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCommandProbe {
    pub program: String,
    pub args: Vec<String>,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    60
}

impl BrowserCommandProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout_secs: default_probe_timeout(),
        }
    }

    fn args_for(&self, url: &str, screenshot: Option<&Path>) -> Vec<String> {
        let screenshot = screenshot.map(|p| p.display().to_string()).unwrap_or_default();
        self.args
            .iter()
            .map(|a| a.replace("{url}", url).replace("{screenshot}", &screenshot))
            .collect()
    }
}

#[async_trait::async_trait]
impl PageProbe for BrowserCommandProbe {
    async fn load(&self, url: &str, screenshot: Option<&Path>) -> Result<PageSnapshot, QaError> {
        let probe_error = |message: String| QaError::Probe {
            url: url.to_string(),
            message,
        };
        let args = self.args_for(url, screenshot);
        tracing::debug!(%url, program = %self.program, "probing page");

        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), child)
            .await
            .map_err(|_| probe_error(format!("timed out after {}s", self.timeout_secs)))?
            .map_err(|e| probe_error(format!("failed to start {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(probe_error(format!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }
        let mut snapshot: PageSnapshot = serde_json::from_slice(&output.stdout)
            .map_err(|e| probe_error(format!("unreadable snapshot: {e}")))?;
        if snapshot.screenshot.is_none() {
            if let Some(path) = screenshot {
                if tokio::fs::try_exists(path).await.unwrap_or(false) {
                    snapshot.screenshot = Some(path.to_path_buf());
                }
            }
        }
        Ok(snapshot)
    }

    fn captures_screenshots(&self) -> bool {
        self.args.iter().any(|a| a.contains("{screenshot}"))
    }
}
