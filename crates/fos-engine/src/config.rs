//! # Platform Configuration
//!
//! One YAML document describes the asset, the offering terms, the exit
//! policy, and the accounts each component settles through.
//!
//! ```yaml
//! authority: "0xa0"
//! asset:
//!   name: Nocturne Fractions
//!   symbol: NOCT
//!   asset_name: Nocturne in Blue
//!   creator: A. Painter
//!   origin_year: 1921
//!   initial_valuation: "4000000000000"
//!   max_supply: "2000000000000000000000"
//! offering:
//!   price_per_unit: "2000000000"
//!   unit_cap: "2000000000000000000000"
//!   account: "0xb1"
//! exit:
//!   account: "0xb2"
//! governance:
//!   account: "0xb3"
//! ```
//!
//! Amounts are base-unit strings, exactly as they appear on the wire.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use fos_core::{Address, FosError, FosResult, PricePerUnit, SettlementAmount, UnitAmount};
use fos_governance::DEFAULT_VOTING_PERIOD_SECS;

/// Complete platform configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Privileged caller for the registry, offering, exit, and cancellation.
    pub authority: Address,
    pub asset: AssetConfig,
    pub offering: OfferingConfig,
    pub exit: ExitConfig,
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
}

/// The tokenized asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetConfig {
    pub name: String,
    pub symbol: String,
    pub asset_name: String,
    pub creator: String,
    pub origin_year: u16,
    pub initial_valuation: SettlementAmount,
    pub max_supply: UnitAmount,
    #[serde(default)]
    pub transfers_enabled: bool,
}

/// Primary offering terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfferingConfig {
    pub price_per_unit: PricePerUnit,
    pub unit_cap: UnitAmount,
    /// Receives purchase funds; the only account allowed to issue units.
    pub account: Address,
}

/// Exit distribution policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExitConfig {
    /// Holds deposited proceeds; the only account allowed to retire units.
    pub account: Address,
    /// Require an executed exit-sale proposal before proceeds are accepted.
    #[serde(default = "default_true")]
    pub require_governance_approval: bool,
}

/// Governance parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GovernanceConfig {
    /// The only account allowed to toggle transfers. Used solely by
    /// executed proposals.
    pub account: Address,
    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,
}

/// Settlement token parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettlementConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_voting_period() -> u64 {
    DEFAULT_VOTING_PERIOD_SECS
}

fn default_symbol() -> String {
    "USDC".to_string()
}

impl PlatformConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> FosResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| FosError::Config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a YAML file.
    pub fn from_yaml_file(path: &Path) -> FosResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FosError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> FosResult<()> {
        if self.asset.symbol.trim().is_empty() {
            return Err(FosError::Config("asset.symbol is empty".into()));
        }
        if self.asset.max_supply.is_zero() {
            return Err(FosError::Config("asset.max_supply must be positive".into()));
        }
        if self.offering.price_per_unit.is_zero() {
            return Err(FosError::Config("offering.price_per_unit must be positive".into()));
        }
        if self.offering.unit_cap.is_zero() {
            return Err(FosError::Config("offering.unit_cap must be positive".into()));
        }
        if self.offering.unit_cap > self.asset.max_supply {
            return Err(FosError::Config(format!(
                "offering.unit_cap {} exceeds asset.max_supply {}",
                self.offering.unit_cap, self.asset.max_supply
            )));
        }
        if self.governance.voting_period_secs == 0 {
            return Err(FosError::Config(
                "governance.voting_period_secs must be positive".into(),
            ));
        }
        let accounts = [
            ("authority", &self.authority),
            ("offering.account", &self.offering.account),
            ("exit.account", &self.exit.account),
            ("governance.account", &self.governance.account),
        ];
        let mut seen = BTreeSet::new();
        for (field, account) in accounts {
            if !seen.insert(account) {
                return Err(FosError::Config(format!(
                    "{field} {account} is already used by another role"
                )));
            }
        }
        Ok(())
    }
}
