//! `gate run`

use super::qa::{base_url_arg, build_suite, url_list};
use super::{json_flag, print_json, Outcome};
use crate::builtins::{ContentGate, QaGate, SharedQaRun};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use pubkit_gate::{GateId, GateMode, ReleaseGate};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) fn command() -> Command {
    Command::new("gate")
        .about("Release gate")
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Run the gates in order, stopping at the first failure")
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_parser(["ci", "local"])
                        .help("ci runs every gate, local skips ci-only gates (default: [gate].mode)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Summary directory (default: artifacts/release-gate)"),
                )
                .arg(base_url_arg())
                .arg(json_flag()),
        )
}

pub(crate) async fn run(matches: &ArgMatches, config: &Config) -> Result<Outcome> {
    let args = matches.subcommand_matches("run").context("missing gate subcommand")?;
    let mode = match args.get_one::<String>("mode") {
        Some(mode) => mode.parse::<GateMode>()?,
        None => config.gate.mode,
    };
    let out = args.get_one::<PathBuf>("out").unwrap_or(&config.gate.out_dir);
    let base_url = args.get_one::<String>("base-url").map(String::as_str);

    let qa = Arc::new(SharedQaRun::new(
        build_suite(config, base_url)?,
        url_list(config, None).await?,
        out.clone(),
    ));
    let gate = ReleaseGate::new(&config.gate.workdir)
        .with_builtin(GateId::Seo, Arc::new(QaGate::seo(Arc::clone(&qa))))
        .with_builtin(GateId::I18n, Arc::new(QaGate::i18n(qa)))
        .with_builtin(
            GateId::Content,
            Arc::new(ContentGate::new(
                config.paper.registry.clone(),
                config.paper.thresholds.clone(),
            )),
        );

    let summary = gate.run(&config.gate.plan(), mode).await;
    summary.write(out).await.context("cannot write gate summary")?;
    if args.get_flag("json") {
        print_json(&summary)?;
    } else {
        print!("{}", summary.to_markdown());
    }
    Ok(Outcome::from_passed(summary.ready))
}
