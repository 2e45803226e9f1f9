//! # Error Types — One Taxonomy for Every Component
//!
//! Defines the error kinds surfaced verbatim to the presentation layer.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Every command fails atomically: when one of these is returned, the
//!   component that produced it has made no state change.
//! - Variants carry the structured context needed to explain the failure
//!   (who, how much was needed, how much was available).
//! - [`FosError::kind()`] gives a stable machine-readable code for API
//!   bodies and metrics labels.

use thiserror::Error;

use crate::identity::{Address, ProposalId};

/// Convenience alias used across the workspace.
pub type FosResult<T> = Result<T, FosError>;

/// Top-level error type for the Fractional Ownership Stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FosError {
    /// Caller lacks the authority required for the command.
    #[error("permission denied: {caller} may not {action}")]
    PermissionDenied {
        /// The rejected caller.
        caller: Address,
        /// The attempted action.
        action: String,
    },

    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A party is not currently verified in the compliance registry.
    #[error("address {0} is not verified")]
    NotVerified(Address),

    /// Unit transfers are disabled by governance.
    #[error("transfers are restricted")]
    TransfersRestricted,

    /// The account holds fewer units or settlement funds than required.
    #[error("insufficient balance for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        /// The account that was debited.
        holder: Address,
        /// Amount required, rendered in base units.
        needed: String,
        /// Amount available, rendered in base units.
        available: String,
    },

    /// The spender has not been pre-authorized for enough funds.
    #[error("insufficient allowance from {owner} to {spender}: needed {needed}, approved {approved}")]
    InsufficientAllowance {
        /// Owner of the funds.
        owner: Address,
        /// Spender that attempted the pull.
        spender: Address,
        /// Amount required, rendered in base units.
        needed: String,
        /// Amount approved, rendered in base units.
        approved: String,
    },

    /// The command would exceed a fixed cap.
    #[error("cap exceeded: requested {requested}, remaining {remaining}")]
    CapExceeded {
        /// Amount requested, rendered in base units.
        requested: String,
        /// Amount still available under the cap, rendered in base units.
        remaining: String,
    },

    /// The primary offering is closed.
    #[error("sale is not active")]
    SaleInactive,

    /// Exit proceeds were already deposited.
    #[error("proceeds already deposited")]
    AlreadyDeposited,

    /// Exit proceeds have not been deposited yet.
    #[error("proceeds not yet deposited")]
    NotYetDeposited,

    /// The voter already voted on this proposal.
    #[error("{voter} already voted on {proposal_id}")]
    AlreadyVoted {
        /// The proposal.
        proposal_id: ProposalId,
        /// The voter.
        voter: Address,
    },

    /// The voting window has closed.
    #[error("voting closed for {0}")]
    VotingClosed(ProposalId),

    /// The voting window is still open.
    #[error("voting still open for {0}")]
    VotingStillOpen(ProposalId),

    /// The proposal is no longer active.
    #[error("{proposal_id} is not active (status {status})")]
    ProposalNotActive {
        /// The proposal.
        proposal_id: ProposalId,
        /// Its current status.
        status: String,
    },

    /// Execution attempted on a proposal whose tally does not pass.
    #[error("{proposal_id} rejected on tally: for {votes_for}, against {votes_against}")]
    ProposalRejectedOnTally {
        /// The proposal.
        proposal_id: ProposalId,
        /// Weighted votes in favour, base units.
        votes_for: String,
        /// Weighted votes against, base units.
        votes_against: String,
    },

    /// Amount is zero, negative, malformed, or overflows.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Proposal payload does not decode for its proposal type.
    #[error("invalid proposal payload: {0}")]
    InvalidPayload(String),

    /// The settlement asset refused a leg of a two-phase operation.
    #[error("settlement failure: {0}")]
    SettlementFailure(String),

    /// Configuration is invalid (startup only).
    #[error("configuration error: {0}")]
    Config(String),
}

impl FosError {
    /// Stable, machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NotVerified(_) => "NOT_VERIFIED",
            Self::TransfersRestricted => "TRANSFERS_RESTRICTED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "INSUFFICIENT_ALLOWANCE",
            Self::CapExceeded { .. } => "CAP_EXCEEDED",
            Self::SaleInactive => "SALE_INACTIVE",
            Self::AlreadyDeposited => "ALREADY_DEPOSITED",
            Self::NotYetDeposited => "NOT_YET_DEPOSITED",
            Self::AlreadyVoted { .. } => "ALREADY_VOTED",
            Self::VotingClosed(_) => "VOTING_CLOSED",
            Self::VotingStillOpen(_) => "VOTING_STILL_OPEN",
            Self::ProposalNotActive { .. } => "PROPOSAL_NOT_ACTIVE",
            Self::ProposalRejectedOnTally { .. } => "PROPOSAL_REJECTED_ON_TALLY",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::SettlementFailure(_) => "SETTLEMENT_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Construct a `PermissionDenied` for `caller` attempting `action`.
    pub fn permission_denied(caller: &Address, action: &str) -> Self {
        Self::PermissionDenied {
            caller: caller.clone(),
            action: action.to_string(),
        }
    }

    /// Construct an `InsufficientBalance` from displayable amounts.
    pub fn insufficient_balance(
        holder: &Address,
        needed: impl std::fmt::Display,
        available: impl std::fmt::Display,
    ) -> Self {
        Self::InsufficientBalance {
            holder: holder.clone(),
            needed: needed.to_string(),
            available: available.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_kind_codes_are_screaming_snake() {
        let errors = vec![
            FosError::permission_denied(&addr("0x01"), "close sale"),
            FosError::NotFound("identity".into()),
            FosError::TransfersRestricted,
            FosError::SaleInactive,
            FosError::AlreadyDeposited,
            FosError::NotYetDeposited,
            FosError::InvalidAmount("zero".into()),
        ];
        for err in errors {
            let kind = err.kind();
            assert!(kind.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{kind}");
        }
    }

    #[test]
    fn test_insufficient_balance_message_carries_context() {
        let err = FosError::insufficient_balance(&addr("0xab"), 10u128, 3u128);
        let msg = err.to_string();
        assert!(msg.contains(addr("0xab").as_str()));
        assert!(msg.contains("needed 10"));
        assert!(msg.contains("available 3"));
    }

    #[test]
    fn test_permission_denied_display() {
        let err = FosError::permission_denied(&addr("0x0f"), "withdraw funds");
        assert_eq!(
            err.to_string(),
            format!("permission denied: {} may not withdraw funds", addr("0x0f"))
        );
        assert_eq!(err.kind(), "PERMISSION_DENIED");
    }
}
