//! # Fixed-Point Amounts
//!
//! Ownership units carry 18 decimals; the settlement asset carries 6. Both
//! are stored as raw base units in `u128` and are distinct types, so a unit
//! amount can never be paid out as settlement funds without passing through
//! a [`PricePerUnit`].
//!
//! ## Rounding
//!
//! Every conversion floors. `cost = floor(units * price / 10^18)`: the
//! investor is never charged for a fraction of a settlement base unit they
//! did not receive, and a redeemer is never paid one the pool does not hold.
//!
//! ## Serialization
//!
//! Amounts serialize as base-10 strings. Deserialization accepts a string or
//! a non-negative JSON integer. Floats are rejected.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FosError, FosResult};

/// Decimals of the ownership unit.
pub const UNIT_DECIMALS: u32 = 18;

/// Decimals of the settlement asset.
pub const SETTLEMENT_DECIMALS: u32 = 6;

/// Base units in one whole ownership unit (`10^18`).
pub const UNIT_SCALE: u128 = 10u128.pow(UNIT_DECIMALS);

/// Base units in one whole settlement token (`10^6`).
pub const SETTLEMENT_SCALE: u128 = 10u128.pow(SETTLEMENT_DECIMALS);

macro_rules! base_unit_amount {
    ($(#[$meta:meta])* $name:ident, $scale:expr, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u128);

        impl $name {
            /// Zero.
            pub const ZERO: $name = $name(0);

            /// Wrap a raw base-unit quantity.
            pub const fn new(raw: u128) -> Self {
                Self(raw)
            }

            /// A whole-token quantity, scaled to base units.
            pub fn from_whole(whole: u128) -> FosResult<Self> {
                whole.checked_mul($scale).map(Self).ok_or_else(|| {
                    FosError::InvalidAmount(format!(concat!($label, " overflow: {} whole"), whole))
                })
            }

            /// The raw base-unit quantity.
            pub const fn raw(&self) -> u128 {
                self.0
            }

            /// Whether this amount is zero.
            pub const fn is_zero(&self) -> bool {
                self.0 == 0
            }

            /// Checked addition; overflow is `InvalidAmount`.
            pub fn checked_add(self, other: Self) -> FosResult<Self> {
                self.0.checked_add(other.0).map(Self).ok_or_else(|| {
                    FosError::InvalidAmount(format!(concat!($label, " overflow: {} + {}"), self.0, other.0))
                })
            }

            /// Checked subtraction; underflow is `InvalidAmount`.
            pub fn checked_sub(self, other: Self) -> FosResult<Self> {
                self.0.checked_sub(other.0).map(Self).ok_or_else(|| {
                    FosError::InvalidAmount(format!(concat!($label, " underflow: {} - {}"), self.0, other.0))
                })
            }

            /// Subtraction clamped at zero.
            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }

            /// Reject zero amounts on commands.
            pub fn require_positive(self) -> FosResult<Self> {
                if self.0 == 0 {
                    Err(FosError::InvalidAmount(concat!($label, " must be greater than zero").to_string()))
                } else {
                    Ok(self)
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = FosError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_base_units(s).map(Self)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|a| a.0).fold(0u128, u128::saturating_add))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(BaseUnitVisitor).map(Self)
            }
        }
    };
}

base_unit_amount!(
    /// Ownership units in base units (18 decimals).
    UnitAmount,
    UNIT_SCALE,
    "unit amount"
);

base_unit_amount!(
    /// Settlement asset amount in base units (6 decimals).
    SettlementAmount,
    SETTLEMENT_SCALE,
    "settlement amount"
);

base_unit_amount!(
    /// Settlement base units per whole ownership unit.
    ///
    /// A price of `2_000 * 10^6` means one whole unit costs 2,000 settlement
    /// tokens.
    PricePerUnit,
    SETTLEMENT_SCALE,
    "price"
);

impl PricePerUnit {
    /// Settlement value of `units` at this price, floored.
    ///
    /// `floor(units * price / 10^18)`. Overflow is `InvalidAmount`.
    pub fn value_of(&self, units: UnitAmount) -> FosResult<SettlementAmount> {
        let product = units.raw().checked_mul(self.raw()).ok_or_else(|| {
            FosError::InvalidAmount(format!("value overflow: {units} units at price {self}"))
        })?;
        Ok(SettlementAmount::new(product / UNIT_SCALE))
    }

    /// Per-unit price implied by distributing `proceeds` over `supply`, floored.
    ///
    /// `floor(proceeds * 10^18 / supply)`. A zero supply is `InvalidAmount`.
    pub fn from_proceeds(proceeds: SettlementAmount, supply: UnitAmount) -> FosResult<Self> {
        if supply.is_zero() {
            return Err(FosError::InvalidAmount(
                "cannot price proceeds over a zero total supply".to_string(),
            ));
        }
        let scaled = proceeds.raw().checked_mul(UNIT_SCALE).ok_or_else(|| {
            FosError::InvalidAmount(format!("proceeds overflow when scaling: {proceeds}"))
        })?;
        Ok(Self::new(scaled / supply.raw()))
    }
}

fn parse_base_units(s: &str) -> FosResult<u128> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(FosError::InvalidAmount(format!(
            "amount must be a non-negative integer in base units, got {s:?}"
        )));
    }
    trimmed
        .parse::<u128>()
        .map_err(|e| FosError::InvalidAmount(format!("amount {s:?} out of range: {e}")))
}

struct BaseUnitVisitor;

impl<'de> Visitor<'de> for BaseUnitVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a non-negative integer amount as a string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        parse_base_units(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(u128::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
        u128::try_from(v).map_err(|_| E::custom(format!("amount must not be negative: {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u128, E> {
        Err(E::custom(format!(
            "float amounts are not permitted; use a base-unit integer string: {v}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole_units(n: u128) -> UnitAmount {
        UnitAmount::from_whole(n).unwrap()
    }

    fn usd(n: u128) -> SettlementAmount {
        SettlementAmount::from_whole(n).unwrap()
    }

    // ── Pricing ──────────────────────────────────────────────────────

    #[test]
    fn test_cost_of_ten_units_at_two_thousand() {
        let price = PricePerUnit::from_whole(2_000).unwrap();
        assert_eq!(price.value_of(whole_units(10)).unwrap(), usd(20_000));
    }

    #[test]
    fn test_value_floors_sub_unit_remainder() {
        // 1 base unit of ownership at 2,000 USDC is 2e9 / 1e18 settlement units -> 0.
        let price = PricePerUnit::from_whole(2_000).unwrap();
        assert_eq!(price.value_of(UnitAmount::new(1)).unwrap(), SettlementAmount::ZERO);

        // A third of a unit at 1 USDC is 333,333.33 base units: floors.
        let units = UnitAmount::new(UNIT_SCALE / 3);
        let value = PricePerUnit::new(1_000_000).value_of(units).unwrap();
        assert_eq!(value, SettlementAmount::new(333_333));
    }

    #[test]
    fn test_price_from_proceeds() {
        let price = PricePerUnit::from_proceeds(usd(4_200_000), whole_units(2_000)).unwrap();
        assert_eq!(price, PricePerUnit::from_whole(2_100).unwrap());
        assert_eq!(price.value_of(whole_units(10)).unwrap(), usd(21_000));
    }

    #[test]
    fn test_price_from_proceeds_floors() {
        let price = PricePerUnit::from_proceeds(SettlementAmount::new(10), whole_units(3)).unwrap();
        assert_eq!(price.raw(), 3);
    }

    #[test]
    fn test_price_over_zero_supply_rejected() {
        let err = PricePerUnit::from_proceeds(usd(1), UnitAmount::ZERO).unwrap_err();
        assert_eq!(err.kind(), "INVALID_AMOUNT");
    }

    #[test]
    fn test_value_overflow_is_invalid_amount() {
        let err = PricePerUnit::new(u128::MAX).value_of(whole_units(2)).unwrap_err();
        assert_eq!(err.kind(), "INVALID_AMOUNT");
    }

    // ── Arithmetic ───────────────────────────────────────────────────

    #[test]
    fn test_checked_arithmetic() {
        let a = UnitAmount::new(5);
        assert_eq!(a.checked_add(UnitAmount::new(2)).unwrap(), UnitAmount::new(7));
        assert!(a.checked_sub(UnitAmount::new(6)).is_err());
        assert!(UnitAmount::new(u128::MAX).checked_add(UnitAmount::new(1)).is_err());
        assert_eq!(a.saturating_sub(UnitAmount::new(9)), UnitAmount::ZERO);
    }

    #[test]
    fn test_require_positive() {
        assert!(UnitAmount::ZERO.require_positive().is_err());
        assert!(SettlementAmount::new(1).require_positive().is_ok());
    }

    // ── Serde ────────────────────────────────────────────────────────

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&whole_units(1)).unwrap();
        assert_eq!(json, "\"1000000000000000000\"");
    }

    #[test]
    fn test_deserializes_string_or_integer() {
        let a: UnitAmount = serde_json::from_str("\"42\"").unwrap();
        let b: UnitAmount = serde_json::from_str("42").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_float_and_negative() {
        assert!(serde_json::from_str::<SettlementAmount>("1.5").is_err());
        assert!(serde_json::from_str::<SettlementAmount>("-1").is_err());
        assert!(serde_json::from_str::<SettlementAmount>("\"-1\"").is_err());
        assert!(serde_json::from_str::<SettlementAmount>("\"1e6\"").is_err());
    }

    #[test]
    fn test_from_str() {
        let price: PricePerUnit = "2000000000".parse().unwrap();
        assert_eq!(price, PricePerUnit::from_whole(2_000).unwrap());
    }

    // ── Properties ───────────────────────────────────────────────────

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn value_never_rounds_up(units in 0u128..=10u128.pow(24), price in 0u128..=10u128.pow(12)) {
            let value = PricePerUnit::new(price).value_of(UnitAmount::new(units)).unwrap();
            prop_assert!(value.raw() * UNIT_SCALE <= units * price);
            prop_assert!(units * price - value.raw() * UNIT_SCALE < UNIT_SCALE);
        }

        #[test]
        fn redemption_of_full_supply_never_exceeds_proceeds(
            proceeds in 1u128..=10u128.pow(15),
            supply in 1u128..=10u128.pow(24),
        ) {
            let proceeds = SettlementAmount::new(proceeds);
            let supply = UnitAmount::new(supply);
            let price = PricePerUnit::from_proceeds(proceeds, supply).unwrap();
            let payout = price.value_of(supply).unwrap();
            prop_assert!(payout <= proceeds);
        }

        #[test]
        fn string_form_parses_back(raw in any::<u128>()) {
            let amount = SettlementAmount::new(raw);
            let parsed: SettlementAmount = amount.to_string().parse().unwrap();
            prop_assert_eq!(parsed, amount);
        }
    }
}
