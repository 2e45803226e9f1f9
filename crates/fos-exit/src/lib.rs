//! # fos-exit — Exit Distribution
//!
//! After the underlying asset is sold, the authority deposits the proceeds
//! once. The deposit fixes `final_price_per_unit` from the total supply at
//! that instant; holders then redeem units for settlement funds at that
//! price until the proceeds are exhausted.
//!
//! ## States
//!
//! ```text
//! Awaiting ──authorize_deposit──▶ Authorized ──deposit_proceeds──▶ Deposited
//! ```
//!
//! When governance approval is not required, `Awaiting` deposits directly.
//! `Deposited` is terminal and the final price never changes afterwards.

pub mod distribution;

pub use distribution::{DistributionState, ExitDistribution, BASIS_POINTS};
