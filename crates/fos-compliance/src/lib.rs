//! # fos-compliance — Compliance Registry
//!
//! The authoritative list of verified participants. Every other component
//! asks this registry, through [`ComplianceOracle`], whether an address is
//! currently allowed to hold, move, buy, propose, or vote.
//!
//! ## Record Lifecycle
//!
//! ```text
//! (absent) ──add──▶ Verified ──remove──▶ Unverified ──renew──▶ Verified
//!                      │                                   ▲
//!                      └──────────────renew────────────────┘
//! ```
//!
//! Records are never deleted. Removing an identity clears its `verified`
//! flag and keeps the record for audit. Expiry is lazy: a verified record
//! whose `expiry_date` has passed simply stops answering `true`.
//!
//! ## Crate Policy
//!
//! - Only the configured authority may mutate records.
//! - `is_verified` is a pure query: unknown addresses are `false`, never an error.

pub mod registry;

pub use registry::{ComplianceRegistry, Identity};
