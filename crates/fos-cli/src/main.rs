//! # fos CLI entry point
//!
//! Parses command-line arguments, initializes tracing, and dispatches to
//! subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fos_cli::config::{run_config, ConfigArgs};
use fos_cli::scenario::{run_scenario, ScenarioArgs};
use fos_cli::serve::{run_serve, ServeArgs};

/// Fractional Ownership Stack CLI.
///
/// Serves the compliance-gated ownership ledger over HTTP, replays scripted
/// scenarios against it, and checks platform configuration files.
#[derive(Parser, Debug)]
#[command(name = "fos", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),

    /// Replay a scenario file and report every outcome.
    Scenario(ScenarioArgs),

    /// Platform configuration tools.
    Config(ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // `RUST_LOG` wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    tracing::debug!("fos CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Serve(args) => run_serve(&args),
        Commands::Scenario(args) => run_scenario(&args),
        Commands::Config(args) => run_config(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
