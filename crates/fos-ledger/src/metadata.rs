//! # Token Metadata

use serde::{Deserialize, Serialize};

use fos_core::SettlementAmount;

/// Descriptive metadata of the tokenized asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Name of the underlying asset.
    pub asset_name: String,
    /// Creator of the underlying asset.
    pub creator: String,
    /// Year the underlying asset was created.
    pub origin_year: u16,
    /// Appraised value at tokenization, in settlement base units.
    pub initial_valuation: SettlementAmount,
    /// Whether holder-to-holder transfers are currently allowed.
    pub transfers_enabled: bool,
}
