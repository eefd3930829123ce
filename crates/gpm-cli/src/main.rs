//! GitHub Projects migrator CLI.

use std::io::{self, IsTerminal};

use chrono::Local;
use clap::{ColorChoice, Parser};
use gpm_cli::exit;
use gpm_cli::logging::{LogConfig, LogFormat, default_log_path, init_logging};
use tracing::error;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_export, run_export_issues, run_import, run_link_issues};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(exit::OTHER);
    }

    let result = match &cli.command {
        Command::Export(args) => run_export(args),
        Command::Import(args) => run_import(args),
        Command::ExportIssues(args) => run_export_issues(args),
        Command::LinkIssues(args) => run_link_issues(args),
    };

    let exit_code = match result {
        Ok(()) => exit::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            if let Some(hint) = exit::suggestion(&err) {
                error!("hint: {hint}");
            }
            exit::exit_code(&err)
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = if cli.no_log_file {
        None
    } else {
        Some(
            cli.log_file
                .clone()
                .unwrap_or_else(|| default_log_path(cli.command.name(), Local::now())),
        )
    };
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stderr().is_terminal(),
    };
    config
}
