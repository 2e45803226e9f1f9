//! # fos-cli — Command-Line Interface for the Fractional Ownership Stack
//!
//! Provides the `fos` binary.
//!
//! ## Subcommands
//!
//! - `fos serve --config <platform.yaml>` — Run the HTTP API over a fresh
//!   in-memory platform.
//! - `fos scenario <scenario.yaml>` — Replay a scripted sequence of commands
//!   against a platform on a manual clock and report every outcome.
//! - `fos config check <platform.yaml>` — Parse, validate, and build a
//!   platform from a configuration file without serving it.
//!
//! ```bash
//! fos config check demos/platform.yaml
//! fos -v scenario demos/scenario.yaml
//! FOS_AUTH_TOKEN=s3cret fos serve --config demos/platform.yaml
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from command handlers.
//! - Handlers delegate to `fos-engine`; no ledger rules live here.

pub mod config;
pub mod scenario;
pub mod serve;

use std::path::{Path, PathBuf};

/// Resolve `path` against the directory containing `anchor`.
///
/// Absolute paths are returned unchanged. Scenario files name their platform
/// configuration relative to themselves, not to the working directory.
pub fn resolve_relative_to(anchor: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match anchor.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
