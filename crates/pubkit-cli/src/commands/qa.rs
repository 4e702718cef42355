//! `qa run`, `qa root`

use super::paper::{load_registry, load_urls};
use super::{exists, json_flag, print_json, Outcome};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use pubkit_qa::{QaReport, QaSuite, UrlList};
use std::path::{Path, PathBuf};

pub(crate) fn base_url_arg() -> Arg {
    Arg::new("base-url")
        .long("base-url")
        .help("Site to check (default: [site].base_url or PUBKIT_BASE_URL)")
}

pub(crate) fn command() -> Command {
    Command::new("qa")
        .about("i18n/SEO checks against a running site")
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Check every url of the list and the root redirect")
                .arg(
                    Arg::new("urls")
                        .long("urls")
                        .value_parser(value_parser!(PathBuf))
                        .help("Url list (default: [qa].urls)"),
                )
                .arg(base_url_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Report directory (default: artifacts/qa)"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("root")
                .about("Check that / redirects to a locale")
                .arg(base_url_arg())
                .arg(json_flag()),
        )
}

/// Suite for the configured site, optionally against another base URL
pub(crate) fn build_suite(config: &Config, base_url: Option<&str>) -> Result<QaSuite> {
    QaSuite::new(config.qa_options(base_url), config.locales()?).context("invalid [qa] settings")
}

/// Url list from `explicit` or `[qa].urls`, plus registry detail pages
pub(crate) async fn url_list(config: &Config, explicit: Option<&Path>) -> Result<UrlList> {
    let default_list = exists(&config.qa.urls).await;
    let list = match explicit {
        Some(path) => load_urls(path).await?,
        None if default_list => load_urls(&config.qa.urls).await?,
        None => {
            tracing::warn!(path = %config.qa.urls.display(), "url list not found, checking registry pages only");
            UrlList::default()
        }
    };
    if !config.qa.include_registry || !exists(&config.paper.registry).await {
        return Ok(list);
    }
    let registry = load_registry(&config.paper.registry).await?;
    Ok(list.with_registry_paths(&registry, &config.locales()?))
}

pub(crate) async fn run(matches: &ArgMatches, config: &Config) -> Result<Outcome> {
    let (name, args) = matches.subcommand().context("missing qa subcommand")?;
    let base_url = args.get_one::<String>("base-url").map(String::as_str);
    let suite = build_suite(config, base_url)?;

    match name {
        "run" => {
            let urls = url_list(config, args.get_one::<PathBuf>("urls").map(PathBuf::as_path)).await?;
            let report = suite.run(&urls).await;
            let out = args.get_one::<PathBuf>("out").unwrap_or(&config.qa.out_dir);
            report.write(out).await.context("cannot write qa report")?;
            if args.get_flag("json") {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
            Ok(Outcome::from_passed(report.passed))
        }
        "root" => {
            let root = suite.root().await;
            if args.get_flag("json") {
                print_json(&root)?;
            } else {
                let location = root.location.as_deref().unwrap_or("-");
                println!("{} -> {} {}", root.url, root.status, location);
                for issue in &root.issues {
                    println!("  {}", issue.message);
                }
            }
            Ok(Outcome::from_passed(root.passed()))
        }
        other => anyhow::bail!("unknown qa subcommand '{other}'"),
    }
}

fn print_report(report: &QaReport) {
    for outcome in &report.outcomes {
        let status = outcome.status.map_or_else(|| "---".to_string(), |s| s.to_string());
        let verdict = if outcome.passed() { "ok" } else { "FAIL" };
        let kind = if outcome.critical { "critical" } else { "light" };
        println!("{verdict:<4} {status} {kind:<8} {}", outcome.url);
        for issue in &outcome.issues {
            println!("       {}", issue.message);
        }
    }
    println!(
        "{} urls, {} issues: {}",
        report.outcomes.len(),
        report.issue_count(),
        if report.passed { "passed" } else { "failed" }
    );
}
