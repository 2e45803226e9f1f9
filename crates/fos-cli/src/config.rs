//! # Config Subcommand
//!
//! - `fos config check <path>` — Parse and validate a platform
//!   configuration, then build a platform from it. Exit code 0 when the
//!   file is usable, 1 otherwise.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use fos_core::SystemClock;
use fos_engine::{Platform, PlatformConfig};

/// Arguments for the `fos config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate a platform configuration file.
    Check {
        /// Path to the platform YAML.
        path: PathBuf,
    },
}

/// Execute the config subcommand.
pub fn run_config(args: &ConfigArgs) -> Result<u8> {
    match &args.command {
        ConfigCommand::Check { path } => cmd_check(path),
    }
}

fn cmd_check(path: &Path) -> Result<u8> {
    let config = match PlatformConfig::from_yaml_file(path) {
        Ok(config) => config,
        Err(e) => {
            println!("FAIL: {}", path.display());
            println!("  {e}");
            return Ok(1);
        }
    };
    let platform = Platform::new(&config, Arc::new(SystemClock))
        .with_context(|| format!("building platform from {}", path.display()))?;

    let snapshot = platform.snapshot();
    println!("OK: {}", path.display());
    println!(
        "  Asset:       {} ({})",
        snapshot.metadata.name, snapshot.metadata.symbol
    );
    println!("  Max supply:  {}", snapshot.max_supply);
    println!("  Price/unit:  {}", snapshot.offering.price_per_unit);
    println!("  Unit cap:    {}", snapshot.offering.unit_cap);
    println!("  Settlement:  {}", snapshot.settlement_symbol);
    println!("  Authority:   {}", platform.authority());
    Ok(0)
}
