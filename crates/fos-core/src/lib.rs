//! # fos-core — Foundational Types for the Fractional Ownership Stack
//!
//! This crate is the bedrock of the stack. It defines the type-system
//! primitives shared by every component: the compliance registry, the asset
//! ledger, the primary offering, the exit distribution, and governance.
//! Every other crate in the workspace depends on `fos-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Address`, `CountryCode`,
//!    `ProposalId` are newtypes with validated constructors. No bare strings
//!    for identifiers.
//!
//! 2. **Scale-typed amounts.** `UnitAmount` (18 decimals) and
//!    `SettlementAmount` (6 decimals) cannot be mixed. The only bridge between
//!    them is [`PricePerUnit`], and every conversion floors.
//!
//! 3. **Single `FosError` enum.** One error taxonomy for every component, so
//!    the presentation layer receives the same typed failure regardless of
//!    which component rejected the command.
//!
//! 4. **Injected time.** Components never read the wall clock. The engine
//!    reads a [`Clock`] once per command and passes `now: Timestamp` down.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fos-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Amounts never serialize as floats.

pub mod amount;
pub mod error;
pub mod identity;
pub mod jurisdiction;
pub mod seams;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use amount::{PricePerUnit, SettlementAmount, UnitAmount, SETTLEMENT_DECIMALS, UNIT_DECIMALS};
pub use error::{FosError, FosResult};
pub use identity::{Address, ProposalId};
pub use jurisdiction::CountryCode;
pub use seams::{BalanceSource, ComplianceOracle};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
