//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers used across the stack. These
//! prevent accidental identifier confusion: a `ProposalId` is never a
//! unit amount, and an `Address` is always normalized.
//!
//! ## Security Invariant
//!
//! `Address` is validated, lowercased and left-padded to 20 bytes at
//! construction, so two spellings of the same account (`0xAB`, `0xab` and
//! `0x00..00ab`) can never hold two separate balances, identity records or
//! vote records.

use serde::{Deserialize, Serialize};

use crate::error::FosError;

/// Maximum number of hex digits in an account address (20 bytes).
const MAX_ADDRESS_HEX_DIGITS: usize = 40;

/// An account address: `0x` followed by 1–40 hex digits, stored as 40
/// lowercase digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address. Short forms are zero-extended.
    ///
    /// # Errors
    ///
    /// Returns `FosError::InvalidPayload` if the input is not `0x`-prefixed
    /// hex of 1 to 40 digits.
    pub fn parse(s: &str) -> Result<Self, FosError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| FosError::InvalidPayload(format!("address must start with 0x: {s:?}")))?;
        if digits.is_empty() || digits.len() > MAX_ADDRESS_HEX_DIGITS {
            return Err(FosError::InvalidPayload(format!(
                "address must have 1-{MAX_ADDRESS_HEX_DIGITS} hex digits: {s:?}"
            )));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FosError::InvalidPayload(format!(
                "address contains non-hex characters: {s:?}"
            )));
        }
        Ok(Self(format!(
            "0x{:0>width$}",
            digits.to_ascii_lowercase(),
            width = MAX_ADDRESS_HEX_DIGITS
        )))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = FosError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl std::str::FromStr for Address {
    type Err = FosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonically increasing governance proposal identifier, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl ProposalId {
    /// The first identifier ever assigned.
    pub const FIRST: ProposalId = ProposalId(1);

    /// The identifier following this one.
    pub fn next(self) -> ProposalId {
        ProposalId(self.0.saturating_add(1))
    }

    /// Access the inner counter value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proposal:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalizes_case() {
        let upper = Address::parse("0xABCDEF").unwrap();
        let lower = Address::parse("0xabcdef").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), format!("0x{}abcdef", "0".repeat(34)));
    }

    #[test]
    fn test_address_spellings_share_one_key() {
        let padded = Address::parse(&format!("0x{}1", "0".repeat(39))).unwrap();
        for spelling in ["0x1", "0x01", "0X0001", "0x0000000001"] {
            assert_eq!(Address::parse(spelling).unwrap(), padded, "{spelling}");
        }
        assert_ne!(Address::parse("0x10").unwrap(), padded);
    }

    #[test]
    fn test_address_display_is_full_width() {
        let a = Address::parse("0xB2").unwrap();
        assert_eq!(a.as_str().len(), 42);
        assert!(a.to_string().ends_with("00b2"));
    }

    #[test]
    fn test_address_accepts_full_width() {
        let full = format!("0x{}", "a".repeat(40));
        assert!(Address::parse(&full).is_ok());
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!(Address::parse("abcdef").is_err());
        assert!(Address::parse("0x").is_err());
        assert!(Address::parse("0xzz").is_err());
        assert!(Address::parse(&format!("0x{}", "1".repeat(41))).is_err());
    }

    #[test]
    fn test_address_serde_validates() {
        let ok: Address = serde_json::from_str("\"0xAb\"").unwrap();
        assert_eq!(ok, Address::parse("0x00ab").unwrap());
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), ok);
    }

    #[test]
    fn test_proposal_id_sequence() {
        let first = ProposalId::FIRST;
        assert_eq!(first.next(), ProposalId(2));
        assert_eq!(first.to_string(), "proposal:1");
    }
}
