//! `paper` (one source) and `papers` (the registry)

use super::{exists, json_flag, print_json, Outcome};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use pubkit_paper::{PaperMetrics, PaperRegistry, PaperSource};
use pubkit_qa::UrlList;
use std::path::{Path, PathBuf};

pub(crate) fn paper_command() -> Command {
    let file = || {
        Arg::new("file")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Markdown paper source")
    };
    Command::new("paper")
        .about("Inspect one paper source")
        .subcommand_required(true)
        .subcommand(
            Command::new("metrics")
                .about("Print word, diagram, table and keyword counts")
                .arg(file())
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("ready")
                .about("Check the paper against the readiness thresholds")
                .arg(file())
                .arg(json_flag()),
        )
}

pub(crate) fn papers_command() -> Command {
    let registry = || {
        Arg::new("registry")
            .long("registry")
            .value_parser(value_parser!(PathBuf))
            .help("Registry file (default: [paper].registry)")
    };
    Command::new("papers")
        .about("Work with the paper registry")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List registered papers")
                .arg(registry())
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("urls")
                .about("Print the QA url list extended with paper detail pages")
                .arg(registry())
                .arg(
                    Arg::new("urls")
                        .long("urls")
                        .value_parser(value_parser!(PathBuf))
                        .help("Base url list (default: [qa].urls)"),
                ),
        )
}

pub(crate) async fn run_paper(matches: &ArgMatches, config: &Config) -> Result<Outcome> {
    let (name, args) = matches.subcommand().context("missing paper subcommand")?;
    let file = args.get_one::<PathBuf>("file").context("missing file")?;
    let json = args.get_flag("json");

    let source = PaperSource::load(file)
        .await
        .with_context(|| format!("cannot load paper '{}'", file.display()))?;
    let metrics = PaperMetrics::from_source(&source);

    match name {
        "metrics" => {
            if json {
                print_json(&metrics)?;
            } else {
                println!("{metrics}");
            }
            Ok(Outcome::Success)
        }
        "ready" => {
            let report = config.paper.thresholds.evaluate(&metrics);
            if json {
                print_json(&serde_json::json!({ "metrics": metrics, "report": report }))?;
            } else {
                println!("{report}");
            }
            Ok(Outcome::from_passed(report.ready))
        }
        other => anyhow::bail!("unknown paper subcommand '{other}'"),
    }
}

pub(crate) async fn run_papers(matches: &ArgMatches, config: &Config) -> Result<Outcome> {
    let (name, args) = matches.subcommand().context("missing papers subcommand")?;
    let registry_path = args
        .get_one::<PathBuf>("registry")
        .unwrap_or(&config.paper.registry);
    let registry = load_registry(registry_path).await?;

    match name {
        "list" => {
            if args.get_flag("json") {
                let entries: Vec<_> = registry.iter().collect();
                print_json(&entries)?;
            } else {
                for entry in registry.iter() {
                    let source = registry
                        .source_path(entry)
                        .map_or_else(|| "-".to_string(), |p| p.display().to_string());
                    let venue = entry.venue.map_or("-", |v| v.as_str());
                    println!("{}\t{}\t{}\t{}\t{}", entry.id, entry.slug, venue, source, entry.title);
                }
            }
            Ok(Outcome::Success)
        }
        "urls" => {
            let default_list = exists(&config.qa.urls).await;
            let list = match args.get_one::<PathBuf>("urls") {
                Some(path) => load_urls(path).await?,
                None if default_list => load_urls(&config.qa.urls).await?,
                None => UrlList::default(),
            };
            let list = list.with_registry_paths(&registry, &config.locales()?);
            print_json(&list)?;
            Ok(Outcome::Success)
        }
        other => anyhow::bail!("unknown papers subcommand '{other}'"),
    }
}

pub(crate) async fn load_registry(path: &Path) -> Result<PaperRegistry> {
    PaperRegistry::load(path)
        .await
        .with_context(|| format!("cannot load paper registry '{}'", path.display()))
}

pub(crate) async fn load_urls(path: &Path) -> Result<UrlList> {
    UrlList::load(path)
        .await
        .with_context(|| format!("cannot load url list '{}'", path.display()))
}
