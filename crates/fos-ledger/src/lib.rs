//! # fos-ledger — Asset Ledger and Settlement Interface
//!
//! Holds the unit balances of the single tokenized asset and its immutable
//! metadata, and defines the narrow interface to the external settlement
//! asset used for purchases and redemptions.
//!
//! - **Ledger** ([`ledger`]): balances, total supply, allowances, and the
//!   compliance-gated `transfer` / `transfer_from`. Issuance and redemption
//!   are restricted to the offering and exit accounts named in [`LedgerRoles`].
//!
//! - **Metadata** ([`metadata`]): name, symbol, and the described asset.
//!   Only `transfers_enabled` ever changes, and only through governance.
//!
//! - **Settlement** ([`settlement`]): the [`SettlementAsset`] trait and an
//!   in-memory 6-decimal stable token used by the engine and tests.
//!
//! ## Invariant
//!
//! `Σ balances == total_supply` after every operation. Balance entries are
//! created on first credit and never removed; zero is a valid balance.

pub mod ledger;
pub mod metadata;
pub mod settlement;

pub use ledger::{AssetLedger, LedgerRoles};
pub use metadata::TokenMetadata;
pub use settlement::{InMemorySettlement, SettlementAsset};
