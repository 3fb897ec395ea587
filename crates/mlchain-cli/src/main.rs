//! # mlchain CLI entry point
//!
//! Checks the verb table first, then loads settings, wires the workflow
//! services and REST client, and hands the command to the dispatcher.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mlchain_cli::{execute, preflight, ApiClient, Dispatcher};
use mlchain_core::Settings;
use mlchain_workflow::Services;

/// mlchain: ledger identities, tokens and model registry.
///
/// Run without a verb to list every verb and its arguments.
#[derive(Parser, Debug)]
#[command(name = "mlchain", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Verb to run.
    verb: Option<String>,

    /// Verb arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut stdout = std::io::stdout();
    let command = match preflight(cli.verb.as_deref(), &cli.args, &mut stdout) {
        Ok(command) => command,
        Err(code) => return Ok(code),
    };

    let settings = Settings::load(cli.settings.as_deref()).context("loading settings")?;
    tracing::debug!(channel = %settings.channel, api = %settings.api_base_url, "settings loaded");

    let api = ApiClient::from_settings(&settings)?;
    let dispatcher = Dispatcher::new(Services::from_settings(settings), api);

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    Ok(runtime.block_on(execute(&dispatcher, command, &mut stdout)))
}
