//! # fos-engine — Platform Composition Root
//!
//! Wires the five components together and is the only place that holds
//! all of them at once.
//!
//! - **Config** ([`config`]): [`PlatformConfig`] loaded from YAML and
//!   validated before any component is built.
//! - **Platform** ([`platform`]): [`Platform`] owns the registry, ledger,
//!   offering, exit distribution, governance engine, settlement token, and
//!   clock. Every command reads the clock once and threads that instant
//!   through each component it touches.
//! - **Journal** ([`journal`]): append-only [`LedgerEvent`] log of every
//!   successful command.
//! - **Shared** ([`shared`]): [`SharedPlatform`], the single-writer lock
//!   that serializes commands across threads.
//!
//! ## Crate Policy
//!
//! - Components never see each other. Cross-component calls are made here,
//!   with explicit borrows of exactly the collaborators each call needs.
//! - Rejected commands are logged at `warn` and counted; they append nothing
//!   to the journal.

pub mod config;
pub mod journal;
pub mod platform;
pub mod shared;

pub use config::{
    AssetConfig, ExitConfig, GovernanceConfig, OfferingConfig, PlatformConfig, SettlementConfig,
};
pub use journal::{EventKind, Journal, LedgerEvent};
pub use platform::{Platform, PlatformSnapshot};
pub use shared::SharedPlatform;
