//! `bundle`

use super::latex::{venue_arg, venue_from};
use super::{json_flag, print_json, Outcome};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pubkit_bundle::{BundleOptions, Bundler};
use std::path::PathBuf;

pub(crate) fn command() -> Command {
    Command::new("bundle")
        .about("Regenerate a venue submission bundle from a Markdown paper")
        .arg(
            Arg::new("file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Markdown paper source"),
        )
        .arg(venue_arg())
        .arg(
            Arg::new("out")
                .long("out")
                .value_parser(value_parser!(PathBuf))
                .help("Bundle directory (default: submission/<venue>)"),
        )
        .arg(
            Arg::new("review-pdf")
                .long("review-pdf")
                .action(ArgAction::SetTrue)
                .help("Also render a review PDF with xelatex"),
        )
        .arg(
            Arg::new("no-normalize")
                .long("no-normalize")
                .action(ArgAction::SetTrue)
                .help("Leave main.tex as Pandoc wrote it"),
        )
        .arg(json_flag())
}

pub(crate) fn options_from(args: &ArgMatches, config: &Config) -> Result<BundleOptions> {
    let source = args.get_one::<PathBuf>("file").context("missing file")?;
    let venue = venue_from(args, config)?;
    let mut options = BundleOptions::new(source, venue);
    options.out_dir = args
        .get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or_else(|| config.bundle.out_root.join(venue.as_str()));
    options.latex = config.latex.clone();
    options.latex.venue = venue;
    options.pandoc.clone_from(&config.bundle.pandoc);
    options.svg_converter.clone_from(&config.bundle.svg_converter);
    options.review_pdf = args
        .get_flag("review-pdf")
        .then(|| config.bundle.review_dir.clone());
    options.normalize = !args.get_flag("no-normalize");
    Ok(options)
}

pub(crate) async fn run(args: &ArgMatches, config: &Config) -> Result<Outcome> {
    let options = options_from(args, config)?;
    let manifest = Bundler::default()
        .build(&options)
        .await
        .with_context(|| format!("cannot build bundle for '{}'", options.source.display()))?;

    if args.get_flag("json") {
        print_json(&manifest)?;
    } else {
        println!(
            "bundle written to {} ({}, {} figures)",
            options.out_dir.display(),
            manifest.venue.as_str(),
            manifest.figures.len()
        );
        for missing in &manifest.missing {
            println!("missing figure: {missing}");
        }
        if let Some(pdf) = &manifest.review_pdf {
            println!("review pdf: {}", pdf.display());
        }
    }
    Ok(Outcome::Success)
}
