//! calfill CLI entry point.

use std::process::ExitCode;

use calfill_core::{TracingConfig, init_tracing};
use clap::Parser;

use calfill_cli::cli::{Cli, Command, ConfigAction};
use calfill_cli::commands;
use calfill_cli::config::CliConfig;
use calfill_cli::error::CliResult;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (cli.log_json, cli.debug) {
        (true, debug) => TracingConfig::structured(debug),
        (false, true) => TracingConfig::cli_debug(),
        (false, false) => TracingConfig::default(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match &cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
            ConfigAction::Dump => {
                commands::config::dump(&load_config(&cli)?, cli.config.as_deref())
            }
            ConfigAction::Validate => commands::config::validate(&load_config(&cli)?),
        },
        None => commands::run::run(&cli, &load_config(&cli)?),
    }
}

fn load_config(cli: &Cli) -> CliResult<CliConfig> {
    match cli.config {
        Some(ref path) => CliConfig::load_from(path),
        None => CliConfig::load(),
    }
}
