//! # Cross-Component Seams
//!
//! Components never reach into one another's maps. The ledger needs to ask
//! "is this address compliant right now?" and governance needs "what does
//! this address hold right now?", and those questions go through these two
//! narrow read-only traits.

use crate::amount::UnitAmount;
use crate::identity::Address;
use crate::temporal::Timestamp;

/// Read-only compliance gate.
pub trait ComplianceOracle {
    /// Whether `address` is verified and unexpired at `now`.
    fn is_verified(&self, address: &Address, now: Timestamp) -> bool;
}

/// Read-only view of unit holdings.
pub trait BalanceSource {
    /// Current balance of `address`; zero for unknown addresses.
    fn balance_of(&self, address: &Address) -> UnitAmount;

    /// Current total supply.
    fn total_supply(&self) -> UnitAmount;
}
