//! Subcommands

pub(crate) mod bundle;
pub(crate) mod gate;
pub(crate) mod latex;
pub(crate) mod paper;
pub(crate) mod qa;

use clap::{Arg, ArgAction};

/// How a command that ran to completion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    /// Check failed: gate failed, QA issues, paper not ready, file not normalized
    Failed,
}

impl Outcome {
    pub(crate) fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Success
        } else {
            Self::Failed
        }
    }
}

pub(crate) fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of text")
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Existence check that treats an unreadable parent as absent
pub(crate) async fn exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
