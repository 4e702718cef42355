//! `pubkit`: paper readiness, LaTeX normalization, submission bundles,
//! release gate and i18n/SEO QA for a multi-locale research site.
//!
//! Exit codes: 0 success, 1 a check failed, 2 usage or I/O error.

mod builtins;
mod commands;
mod config;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use commands::Outcome;
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("pubkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Publication and release tooling for a multi-locale research site")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .env("PUBKIT_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./pubkit.toml when present)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log as JSON lines on stderr"),
        )
        .subcommand(commands::paper::paper_command())
        .subcommand(commands::paper::papers_command())
        .subcommand(commands::latex::command())
        .subcommand(commands::bundle::command())
        .subcommand(commands::gate::command())
        .subcommand(commands::qa::command())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn dispatch(matches: &ArgMatches) -> Result<Outcome> {
    let config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    match matches.subcommand() {
        Some(("paper", args)) => commands::paper::run_paper(args, &config).await,
        Some(("papers", args)) => commands::paper::run_papers(args, &config).await,
        Some(("latex", args)) => commands::latex::run(args, &config).await,
        Some(("bundle", args)) => commands::bundle::run(args, &config).await,
        Some(("gate", args)) => commands::gate::run(args, &config).await,
        Some(("qa", args)) => commands::qa::run(args, &config).await,
        _ => anyhow::bail!("no command given"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));

    match dispatch(&matches).await {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
