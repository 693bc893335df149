// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;

use rattle::config::Config;
use rattle::engine::{Context, ContextOptions, Loader};
use rattle::observability::init_logging;

#[derive(Parser)]
#[command(name = "rattle")]
#[command(about = "Runs the ETL processes described by a configuration file", long_about = None)]
struct Cli {
    /// Root configuration file (JSON, or YAML with a .yaml/.yml extension)
    config: PathBuf,

    /// Log debug output, overriding the configuration
    #[arg(long, conflicts_with = "no_verbose")]
    verbose: bool,

    /// Suppress debug output, overriding the configuration
    #[arg(long)]
    no_verbose: bool,

    /// Parse and validate everything without writing files or database rows
    #[arg(long)]
    dry_run: bool,

    /// Global parameter override, may be repeated
    #[arg(short = 'g', long = "global", value_name = "KEY=VALUE", value_parser = parse_global)]
    globals: Vec<(String, String)>,
}

fn parse_global(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got \"{}\"", arg)),
    }
}

impl Cli {
    fn options(&self) -> ContextOptions {
        let verbose = match (self.verbose, self.no_verbose) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        ContextOptions {
            verbose,
            dry_run: self.dry_run,
            global_overrides: self.globals.iter().cloned().collect::<Config>(),
        }
    }
}

/// Returns whether every process succeeded.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let context = Context::initialise(&cli.config, cli.options())
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(context.log_settings()).context("Failed to initialise logging")?;

    let mut loader = Loader::new(context);
    let summary = loader.run()?;
    Ok(summary.all_succeeded())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("rattle: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
