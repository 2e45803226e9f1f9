//! # fos-offering — Primary Offering
//!
//! A single fixed-price, capped subscription window. Verified buyers
//! pre-authorize the settlement cost to the offering account, then call
//! [`PrimaryOffering::buy_tokens`], which pulls the funds and issues units
//! in one command.
//!
//! ## States
//!
//! ```text
//! Active ──close_sale / exit deposit──▶ Closed
//! ```
//!
//! Closed is terminal. `units_sold ≤ unit_cap` holds in both states.

pub mod offering;

pub use offering::{OfferingState, PrimaryOffering};
