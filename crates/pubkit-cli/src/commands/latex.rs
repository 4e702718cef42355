//! `latex normalize`

use super::{json_flag, print_json, Outcome};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pubkit_paper::latex::{Mode, Normalizer, Venue};
use pubkit_paper::LatexError;
use std::path::PathBuf;

pub(crate) fn command() -> Command {
    Command::new("latex")
        .about("Camera-ready cleanup of .tex and .md sources")
        .subcommand_required(true)
        .subcommand(
            Command::new("normalize")
                .about("Run the normalization passes over files")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(venue_arg())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("check")
                        .help("Report what would change without writing"),
                )
                .arg(
                    Arg::new("check")
                        .long("check")
                        .action(ArgAction::SetTrue)
                        .help("Exit 1 if any file is not already normalized"),
                )
                .arg(json_flag()),
        )
}

pub(crate) fn venue_arg() -> Arg {
    Arg::new("venue")
        .long("venue")
        .value_parser(clap::builder::PossibleValuesParser::new(Venue::ALL.map(Venue::as_str)))
        .help("Target venue (default: [latex].venue)")
}

pub(crate) fn venue_from(args: &ArgMatches, config: &Config) -> Result<Venue> {
    match args.get_one::<String>("venue") {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.latex.venue),
    }
}

pub(crate) async fn run(matches: &ArgMatches, config: &Config) -> Result<Outcome> {
    let args = matches
        .subcommand_matches("normalize")
        .context("missing latex subcommand")?;

    let mut options = config.latex.clone();
    options.venue = venue_from(args, config)?;
    let normalizer = Normalizer::from_options(&options).context("invalid [latex] settings")?;
    let mode = if args.get_flag("check") {
        Mode::Check
    } else if args.get_flag("dry-run") {
        Mode::DryRun
    } else {
        Mode::Write
    };

    let mut reports = Vec::new();
    let mut failed = false;
    for file in args.get_many::<PathBuf>("files").into_iter().flatten() {
        match normalizer.normalize_file(file, mode).await {
            Ok(report) => {
                if mode == Mode::Check && report.changed {
                    failed = true;
                }
                reports.push(report);
            }
            Err(e @ LatexError::NotIdempotent { .. }) => {
                tracing::error!(path = %file.display(), error = %e, "normalization did not settle");
                eprintln!("{}: {e}", file.display());
                failed = true;
            }
            Err(e) => return Err(e).with_context(|| format!("cannot normalize '{}'", file.display())),
        }
    }

    if args.get_flag("json") {
        print_json(&reports)?;
    } else {
        for report in &reports {
            let state = match (report.changed, report.written) {
                (false, _) => "unchanged",
                (true, true) => "normalized",
                (true, false) if mode == Mode::Check => "not normalized",
                (true, false) => "would normalize",
            };
            if report.passes.is_empty() {
                println!("{state}: {}", report.path.display());
            } else {
                println!("{state}: {} ({})", report.path.display(), report.passes.join(", "));
            }
        }
    }
    Ok(Outcome::from_passed(!failed))
}
