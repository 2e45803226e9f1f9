//! # fos-governance — Governance Engine
//!
//! Holders propose, vote with their current balance, and execute passing
//! proposals against the rest of the platform.
//!
//! ## Proposal Lifecycle
//!
//! ```text
//!            ┌──execute / finalize (votes_for > votes_against)──▶ Executed
//!            │
//! Active ────┼──finalize (votes_for ≤ votes_against)────────────▶ Rejected
//!            │
//!            └──cancel (proposer or authority)──────────────────▶ Cancelled
//! ```
//!
//! All three outcomes are terminal. Proposals are never deleted.
//!
//! ## Effects
//!
//! This crate decides *whether* a proposal takes effect. *What* the effect
//! does is delegated to a [`ProposalExecutor`] supplied by the composition
//! root, which owns the ledger and the exit distribution. The effect runs
//! before the status changes, so a failing effect leaves the proposal Active.

pub mod engine;
pub mod proposal;

pub use engine::{GovernanceEngine, ProposalExecutor, VotingPower, DEFAULT_VOTING_PERIOD_SECS};
pub use proposal::{
    decode_hex_payload, Proposal, ProposalKind, ProposalPayload, ProposalStatus,
    StatusTransition, VoteRecord,
};
