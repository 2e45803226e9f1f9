//! # Event Journal
//!
//! Append-only record of every successful command, in application order.
//! Sequence numbers start at 1 and have no gaps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fos_core::{
    Address, CountryCode, PricePerUnit, ProposalId, SettlementAmount, Timestamp, UnitAmount,
};
use fos_governance::{ProposalKind, ProposalPayload};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    IdentityAdded {
        address: Address,
        expiry: Timestamp,
        country: CountryCode,
    },
    IdentityRemoved {
        address: Address,
    },
    IdentityRenewed {
        address: Address,
        expiry: Timestamp,
    },
    UnitsTransferred {
        spender: Option<Address>,
        from: Address,
        to: Address,
        units: UnitAmount,
    },
    UnitAllowanceSet {
        owner: Address,
        spender: Address,
        units: UnitAmount,
    },
    UnitsPurchased {
        buyer: Address,
        units: UnitAmount,
        cost: SettlementAmount,
    },
    SaleClosed,
    FundsWithdrawn {
        to: Address,
        amount: SettlementAmount,
    },
    ProceedsDeposited {
        amount: SettlementAmount,
        final_price_per_unit: PricePerUnit,
    },
    UnitsRedeemed {
        holder: Address,
        units: UnitAmount,
        payout: SettlementAmount,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        kind: ProposalKind,
        proposer: Address,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        support: bool,
        weight: UnitAmount,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
        payload: ProposalPayload,
    },
    ProposalRejected {
        proposal_id: ProposalId,
    },
    ProposalCancelled {
        proposal_id: ProposalId,
        by: Address,
    },
    SettlementApproved {
        owner: Address,
        spender: Address,
        amount: SettlementAmount,
    },
    SettlementMinted {
        to: Address,
        amount: SettlementAmount,
    },
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub sequence: u64,
    pub event_id: Uuid,
    pub at: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// The append-only event log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<LedgerEvent>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn append(&mut self, at: Timestamp, kind: EventKind) -> u64 {
        let sequence = self.last_sequence() + 1;
        self.entries.push(LedgerEvent {
            sequence,
            event_id: Uuid::new_v4(),
            at,
            kind,
        });
        sequence
    }

    /// Sequence number of the newest entry; zero when empty.
    pub fn last_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence).unwrap_or(0)
    }

    /// Entries with a sequence number strictly greater than `since`.
    pub fn since(&self, since: u64) -> &[LedgerEvent] {
        let start = usize::try_from(since)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> Timestamp {
        Timestamp::parse("2026-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_sequences_are_gapless() {
        let mut journal = Journal::new();
        assert_eq!(journal.last_sequence(), 0);
        assert_eq!(journal.append(at(), EventKind::SaleClosed), 1);
        assert_eq!(journal.append(at(), EventKind::SaleClosed), 2);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_since_is_exclusive() {
        let mut journal = Journal::new();
        for _ in 0..5 {
            journal.append(at(), EventKind::SaleClosed);
        }
        let tail = journal.since(3);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 4);
        assert!(journal.since(5).is_empty());
        assert!(journal.since(99).is_empty());
        assert_eq!(journal.since(0).len(), 5);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let mut journal = Journal::new();
        journal.append(at(), EventKind::SaleClosed);
        journal.append(at(), EventKind::SaleClosed);
        let all = journal.since(0);
        assert_ne!(all[0].event_id, all[1].event_id);
    }

    #[test]
    fn test_event_serialization_is_flat() {
        let mut journal = Journal::new();
        journal.append(
            at(),
            EventKind::ProposalRejected {
                proposal_id: ProposalId(3),
            },
        );
        let json = serde_json::to_value(&journal.since(0)[0]).unwrap();
        assert_eq!(json["type"], "proposal_rejected");
        assert_eq!(json["proposal_id"], 3);
        assert_eq!(json["sequence"], 1);
    }
}
