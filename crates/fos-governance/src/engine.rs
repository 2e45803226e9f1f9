//! # Governance Engine
//!
//! ## Voting
//!
//! Weight is the voter's ledger balance at the moment of voting, not a
//! historical snapshot. A holder who votes and then transfers units does
//! not move their vote; the recipient may vote again with the same units.
//!
//! ## Timing
//!
//! No timers. The window closes lazily: `vote` rejects once
//! `now > voting_ends`, and `execute`/`finalize` reject until then.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fos_core::{
    Address, BalanceSource, ComplianceOracle, FosError, FosResult, ProposalId, Timestamp,
    UnitAmount,
};

use crate::proposal::{Proposal, ProposalKind, ProposalPayload, ProposalStatus, VoteRecord};

/// One week.
pub const DEFAULT_VOTING_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// Applies the effect of a passing proposal to the rest of the platform.
pub trait ProposalExecutor {
    /// Apply `proposal.payload`. An error aborts execution and leaves the
    /// proposal Active.
    fn apply(&mut self, proposal: &Proposal) -> FosResult<()>;
}

/// Governance standing of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingPower {
    pub balance: UnitAmount,
    pub verified: bool,
    pub can_vote: bool,
}

/// The governance engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceEngine {
    authority: Address,
    voting_period_secs: u64,
    next_id: ProposalId,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: BTreeMap<ProposalId, BTreeMap<Address, VoteRecord>>,
}

impl GovernanceEngine {
    pub fn new(authority: Address, voting_period_secs: u64) -> Self {
        Self {
            authority,
            voting_period_secs,
            next_id: ProposalId::FIRST,
            proposals: BTreeMap::new(),
            votes: BTreeMap::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn voting_period_secs(&self) -> u64 {
        self.voting_period_secs
    }

    pub fn get_proposal(&self, id: ProposalId) -> FosResult<&Proposal> {
        self.proposals
            .get(&id)
            .ok_or_else(|| FosError::NotFound(id.to_string()))
    }

    /// Number of proposals ever created.
    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// All proposals in creation order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn has_voted(&self, id: ProposalId, voter: &Address) -> bool {
        self.vote_record(id, voter).is_some()
    }

    pub fn vote_record(&self, id: ProposalId, voter: &Address) -> Option<&VoteRecord> {
        self.votes.get(&id).and_then(|by_voter| by_voter.get(voter))
    }

    pub fn has_proposal_passed(&self, id: ProposalId, now: Timestamp) -> FosResult<bool> {
        Ok(self.get_proposal(id)?.has_passed(now))
    }

    pub fn voting_power<C, B>(
        &self,
        address: &Address,
        compliance: &C,
        balances: &B,
        now: Timestamp,
    ) -> VotingPower
    where
        C: ComplianceOracle + ?Sized,
        B: BalanceSource + ?Sized,
    {
        let balance = balances.balance_of(address);
        let verified = compliance.is_verified(address, now);
        VotingPower {
            balance,
            verified,
            can_vote: verified && !balance.is_zero(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open a proposal. The proposer must be verified and hold units.
    #[allow(clippy::too_many_arguments)]
    pub fn create_proposal<C, B>(
        &mut self,
        proposer: &Address,
        kind: ProposalKind,
        description: &str,
        payload: &[u8],
        compliance: &C,
        balances: &B,
        now: Timestamp,
    ) -> FosResult<&Proposal>
    where
        C: ComplianceOracle + ?Sized,
        B: BalanceSource + ?Sized,
    {
        if !compliance.is_verified(proposer, now) {
            return Err(FosError::NotVerified(proposer.clone()));
        }
        let balance = balances.balance_of(proposer);
        if balance.is_zero() {
            return Err(FosError::insufficient_balance(proposer, "any units", balance));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(FosError::InvalidPayload("description is empty".into()));
        }
        let payload = ProposalPayload::decode(kind, payload)?;
        let voting_ends = now.plus_secs(self.voting_period_secs)?;

        let id = self.next_id;
        let proposal = Proposal {
            id,
            kind,
            payload,
            description: description.to_string(),
            proposer: proposer.clone(),
            created_at: now,
            voting_ends,
            votes_for: UnitAmount::ZERO,
            votes_against: UnitAmount::ZERO,
            status: ProposalStatus::Active,
            transitions: Vec::new(),
        };
        self.next_id = id.next();
        tracing::info!(%id, %kind, kind_code = kind.code(), %proposer, %voting_ends, "proposal created");
        Ok(self.proposals.entry(id).or_insert(proposal))
    }

    /// Cast `voter`'s current balance for or against a proposal.
    pub fn vote<C, B>(
        &mut self,
        id: ProposalId,
        voter: &Address,
        support: bool,
        compliance: &C,
        balances: &B,
        now: Timestamp,
    ) -> FosResult<&VoteRecord>
    where
        C: ComplianceOracle + ?Sized,
        B: BalanceSource + ?Sized,
    {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or_else(|| FosError::NotFound(id.to_string()))?;
        proposal.require_active()?;
        if !proposal.is_voting_open(now) {
            return Err(FosError::VotingClosed(id));
        }
        if !compliance.is_verified(voter, now) {
            return Err(FosError::NotVerified(voter.clone()));
        }
        if self.votes.get(&id).is_some_and(|ballots| ballots.contains_key(voter)) {
            return Err(FosError::AlreadyVoted {
                proposal_id: id,
                voter: voter.clone(),
            });
        }
        let weight = balances.balance_of(voter);
        if weight.is_zero() {
            return Err(FosError::insufficient_balance(voter, "any units", weight));
        }
        if support {
            proposal.votes_for = proposal.votes_for.checked_add(weight)?;
        } else {
            proposal.votes_against = proposal.votes_against.checked_add(weight)?;
        }
        tracing::info!(%id, %voter, support, weight = %weight, "vote cast");
        let ballots = self.votes.entry(id).or_default();
        Ok(ballots.entry(voter.clone()).or_insert(VoteRecord {
            proposal_id: id,
            voter: voter.clone(),
            support,
            weight,
            cast_at: now,
        }))
    }

    /// Apply a passing proposal after its window has closed.
    pub fn execute_proposal(
        &mut self,
        id: ProposalId,
        executor: &mut dyn ProposalExecutor,
        now: Timestamp,
    ) -> FosResult<&Proposal> {
        let proposal = self.closed_active_proposal(id, now)?;
        if !proposal.tally_passes() {
            return Err(FosError::ProposalRejectedOnTally {
                proposal_id: id,
                votes_for: proposal.votes_for.to_string(),
                votes_against: proposal.votes_against.to_string(),
            });
        }
        executor.apply(proposal)?;
        proposal.do_transition(ProposalStatus::Executed, now, "tally passed");
        tracing::info!(%id, kind = %proposal.kind, "proposal executed");
        Ok(proposal)
    }

    /// Settle a proposal whose window has closed: execute on a passing
    /// tally, reject otherwise.
    pub fn finalize_proposal(
        &mut self,
        id: ProposalId,
        executor: &mut dyn ProposalExecutor,
        now: Timestamp,
    ) -> FosResult<&Proposal> {
        if self.closed_active_proposal(id, now)?.tally_passes() {
            return self.execute_proposal(id, executor, now);
        }
        let proposal = self.closed_active_proposal(id, now)?;
        proposal.do_transition(ProposalStatus::Rejected, now, "tally failed");
        tracing::info!(
            %id,
            votes_for = %proposal.votes_for,
            votes_against = %proposal.votes_against,
            "proposal rejected"
        );
        Ok(proposal)
    }

    /// Withdraw an Active proposal. Proposer or authority only.
    pub fn cancel_proposal(
        &mut self,
        id: ProposalId,
        caller: &Address,
        now: Timestamp,
    ) -> FosResult<&Proposal> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or_else(|| FosError::NotFound(id.to_string()))?;
        proposal.require_active()?;
        if caller != &proposal.proposer && caller != &self.authority {
            return Err(FosError::permission_denied(caller, "cancel proposal"));
        }
        proposal.do_transition(ProposalStatus::Cancelled, now, "cancelled");
        tracing::info!(%id, %caller, "proposal cancelled");
        Ok(proposal)
    }

    fn closed_active_proposal(&mut self, id: ProposalId, now: Timestamp) -> FosResult<&mut Proposal> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or_else(|| FosError::NotFound(id.to_string()))?;
        proposal.require_active()?;
        if proposal.is_voting_open(now) {
            return Err(FosError::VotingStillOpen(id));
        }
        Ok(proposal)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use fos_compliance::ComplianceRegistry;
    use fos_core::CountryCode;

    #[derive(Default)]
    struct Holdings(BTreeMap<Address, UnitAmount>);

    impl BalanceSource for Holdings {
        fn balance_of(&self, address: &Address) -> UnitAmount {
            self.0.get(address).copied().unwrap_or_default()
        }

        fn total_supply(&self) -> UnitAmount {
            self.0.values().copied().sum()
        }
    }

    #[derive(Default)]
    struct RecordingExecutor {
        applied: Vec<ProposalPayload>,
        fail: bool,
    }

    impl ProposalExecutor for RecordingExecutor {
        fn apply(&mut self, proposal: &Proposal) -> FosResult<()> {
            if self.fail {
                return Err(FosError::AlreadyDeposited);
            }
            self.applied.push(proposal.payload);
            Ok(())
        }
    }

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn units(n: u128) -> UnitAmount {
        UnitAmount::from_whole(n).unwrap()
    }

    fn authority() -> Address {
        addr("0xa0")
    }

    fn start() -> Timestamp {
        Timestamp::parse("2026-01-01T00:00:00Z").unwrap()
    }

    fn after_window() -> Timestamp {
        start().plus_secs(DEFAULT_VOTING_PERIOD_SECS + 1).unwrap()
    }

    fn enable_transfers() -> Vec<u8> {
        ProposalPayload::TransferAuthorization { enabled: true }.encode()
    }

    struct Fixture {
        gov: GovernanceEngine,
        registry: ComplianceRegistry,
        holdings: Holdings,
    }

    impl Fixture {
        fn propose(&mut self, proposer: &Address) -> FosResult<ProposalId> {
            self.gov
                .create_proposal(
                    proposer,
                    ProposalKind::TransferAuthorization,
                    "Open secondary trading",
                    &enable_transfers(),
                    &self.registry,
                    &self.holdings,
                    start(),
                )
                .map(|p| p.id)
        }

        fn vote(&mut self, id: ProposalId, voter: &Address, support: bool) -> FosResult<UnitAmount> {
            self.vote_at(id, voter, support, start())
        }

        fn vote_at(
            &mut self,
            id: ProposalId,
            voter: &Address,
            support: bool,
            now: Timestamp,
        ) -> FosResult<UnitAmount> {
            self.gov
                .vote(id, voter, support, &self.registry, &self.holdings, now)
                .map(|record| record.weight)
        }
    }

    /// 0x01 holds 100, 0x02 holds 300, 0x03 holds 200, 0x04 is verified
    /// with nothing. Total 2,000 with 1,400 unverified at 0x09.
    fn make_fixture() -> Fixture {
        let mut registry = ComplianceRegistry::new(authority());
        let expiry = Timestamp::parse("2030-01-01T00:00:00Z").unwrap();
        for a in ["0x01", "0x02", "0x03", "0x04"] {
            registry
                .add_identity(&authority(), addr(a), expiry, CountryCode::parse("US").unwrap(), start())
                .unwrap();
        }
        let mut holdings = Holdings::default();
        holdings.0.insert(addr("0x01"), units(100));
        holdings.0.insert(addr("0x02"), units(300));
        holdings.0.insert(addr("0x03"), units(200));
        holdings.0.insert(addr("0x09"), units(1_400));
        Fixture {
            gov: GovernanceEngine::new(authority(), DEFAULT_VOTING_PERIOD_SECS),
            registry,
            holdings,
        }
    }

    // ── create ───────────────────────────────────────────────────────

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut f = make_fixture();
        let first = f.propose(&addr("0x01")).unwrap();
        let second = f.propose(&addr("0x02")).unwrap();
        assert_eq!(first, ProposalId::FIRST);
        assert_eq!(second, ProposalId(2));
        assert_eq!(f.gov.proposal_count(), 2);
        let p = f.gov.get_proposal(first).unwrap();
        assert_eq!(p.status, ProposalStatus::Active);
        assert_eq!(p.voting_ends, start().plus_secs(DEFAULT_VOTING_PERIOD_SECS).unwrap());
        assert_eq!(p.payload, ProposalPayload::TransferAuthorization { enabled: true });
    }

    #[test]
    fn test_create_requires_verified_holder() {
        let mut f = make_fixture();
        let err = f.propose(&addr("0x09")).unwrap_err();
        assert_eq!(err, FosError::NotVerified(addr("0x09")));
        let err = f.propose(&addr("0x04")).unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_BALANCE");
        assert_eq!(f.gov.proposal_count(), 0);
    }

    #[test]
    fn test_create_rejects_bad_payload() {
        let mut f = make_fixture();
        let err = f
            .gov
            .create_proposal(
                &addr("0x01"),
                ProposalKind::TransferAuthorization,
                "Open secondary trading",
                &[1],
                &f.registry,
                &f.holdings,
                start(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_PAYLOAD");
        assert_eq!(f.gov.proposal_count(), 0);
    }

    // ── vote ─────────────────────────────────────────────────────────

    #[test]
    fn test_scenario_c_vote_weight_and_double_vote() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x02")).unwrap();
        let weight = f.vote(id, &addr("0x01"), true).unwrap();
        assert_eq!(weight, units(100));
        assert_eq!(f.gov.get_proposal(id).unwrap().votes_for, units(100));
        let err = f.vote(id, &addr("0x01"), true).unwrap_err();
        match err {
            FosError::AlreadyVoted { proposal_id, voter } => {
                assert_eq!(proposal_id, id);
                assert_eq!(voter, addr("0x01"));
            }
            other => panic!("Expected AlreadyVoted, got: {other:?}"),
        }
        assert_eq!(f.gov.get_proposal(id).unwrap().votes_for, units(100));
        assert!(f.gov.has_voted(id, &addr("0x01")));
    }

    #[test]
    fn test_vote_weight_is_balance_at_call_time() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x02")).unwrap();
        f.holdings.0.insert(addr("0x01"), units(150));
        assert_eq!(f.vote(id, &addr("0x01"), false).unwrap(), units(150));
        assert_eq!(f.gov.get_proposal(id).unwrap().votes_against, units(150));
    }

    #[test]
    fn test_vote_after_window_closed() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x02")).unwrap();
        let deadline = f.gov.get_proposal(id).unwrap().voting_ends;
        f.vote_at(id, &addr("0x01"), true, deadline).unwrap();
        let err = f.vote_at(id, &addr("0x02"), true, after_window()).unwrap_err();
        assert_eq!(err, FosError::VotingClosed(id));
    }

    #[test]
    fn test_vote_requires_verification_and_units() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x02")).unwrap();
        assert_eq!(
            f.vote(id, &addr("0x09"), true).unwrap_err(),
            FosError::NotVerified(addr("0x09"))
        );
        let err = f.vote(id, &addr("0x04"), true).unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_BALANCE");
        assert!(!f.gov.has_voted(id, &addr("0x04")));
    }

    #[test]
    fn test_vote_unknown_proposal() {
        let mut f = make_fixture();
        let err = f.vote(ProposalId(42), &addr("0x01"), true).unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    // ── execute ──────────────────────────────────────────────────────

    #[test]
    fn test_scenario_d_passing_tally_executes() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x02"), true).unwrap();
        f.vote(id, &addr("0x03"), false).unwrap();
        let mut exec = RecordingExecutor::default();
        let p = f.gov.execute_proposal(id, &mut exec, after_window()).unwrap();
        assert_eq!(p.status, ProposalStatus::Executed);
        assert_eq!(p.transitions.len(), 1);
        assert_eq!(exec.applied, vec![ProposalPayload::TransferAuthorization { enabled: true }]);
        assert!(f.gov.has_proposal_passed(id, after_window()).unwrap());
    }

    #[test]
    fn test_scenario_d_reverse_tally_fails() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x03"), true).unwrap();
        f.vote(id, &addr("0x02"), false).unwrap();
        let mut exec = RecordingExecutor::default();
        let err = f.gov.execute_proposal(id, &mut exec, after_window()).unwrap_err();
        match err {
            FosError::ProposalRejectedOnTally { .. } => {}
            other => panic!("Expected ProposalRejectedOnTally, got: {other:?}"),
        }
        assert_eq!(f.gov.get_proposal(id).unwrap().status, ProposalStatus::Active);
        assert!(exec.applied.is_empty());
    }

    #[test]
    fn test_execute_while_voting_open() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x02"), true).unwrap();
        let mut exec = RecordingExecutor::default();
        let err = f.gov.execute_proposal(id, &mut exec, start()).unwrap_err();
        assert_eq!(err, FosError::VotingStillOpen(id));
    }

    #[test]
    fn test_failing_effect_keeps_proposal_active() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x02"), true).unwrap();
        let mut exec = RecordingExecutor {
            fail: true,
            ..RecordingExecutor::default()
        };
        assert!(f.gov.execute_proposal(id, &mut exec, after_window()).is_err());
        assert_eq!(f.gov.get_proposal(id).unwrap().status, ProposalStatus::Active);
    }

    #[test]
    fn test_execute_twice_is_not_active() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x02"), true).unwrap();
        let mut exec = RecordingExecutor::default();
        f.gov.execute_proposal(id, &mut exec, after_window()).unwrap();
        let err = f.gov.execute_proposal(id, &mut exec, after_window()).unwrap_err();
        assert_eq!(err.kind(), "PROPOSAL_NOT_ACTIVE");
        assert_eq!(exec.applied.len(), 1);
    }

    // ── finalize ─────────────────────────────────────────────────────

    #[test]
    fn test_finalize_rejects_failing_tally() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x03"), true).unwrap();
        f.vote(id, &addr("0x02"), false).unwrap();
        let mut exec = RecordingExecutor::default();
        let p = f.gov.finalize_proposal(id, &mut exec, after_window()).unwrap();
        assert_eq!(p.status, ProposalStatus::Rejected);
        assert!(exec.applied.is_empty());
        assert!(!f.gov.has_proposal_passed(id, after_window()).unwrap());
    }

    #[test]
    fn test_finalize_rejects_ties_and_empty_tallies() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        let mut exec = RecordingExecutor::default();
        let p = f.gov.finalize_proposal(id, &mut exec, after_window()).unwrap();
        assert_eq!(p.status, ProposalStatus::Rejected);
    }

    #[test]
    fn test_finalize_executes_passing_tally() {
        let mut f = make_fixture();
        let id = f.propose(&addr("0x01")).unwrap();
        f.vote(id, &addr("0x02"), true).unwrap();
        let mut exec = RecordingExecutor::default();
        let p = f.gov.finalize_proposal(id, &mut exec, after_window()).unwrap();
        assert_eq!(p.status, ProposalStatus::Executed);
        assert_eq!(exec.applied.len(), 1);
    }

    // ── cancel ───────────────────────────────────────────────────────

    #[test]
    fn test_cancel_by_proposer_or_authority() {
        let mut f = make_fixture();
        let a = f.propose(&addr("0x01")).unwrap();
        let b = f.propose(&addr("0x01")).unwrap();
        let err = f.gov.cancel_proposal(a, &addr("0x02"), start()).unwrap_err();
        assert_eq!(err.kind(), "PERMISSION_DENIED");
        f.gov.cancel_proposal(a, &addr("0x01"), start()).unwrap();
        f.gov.cancel_proposal(b, &authority(), start()).unwrap();
        assert_eq!(f.gov.get_proposal(a).unwrap().status, ProposalStatus::Cancelled);
        let err = f.vote(a, &addr("0x02"), true).unwrap_err();
        assert_eq!(err.kind(), "PROPOSAL_NOT_ACTIVE");
    }

    // ── voting power ─────────────────────────────────────────────────

    #[test]
    fn test_voting_power() {
        let f = make_fixture();
        let power = f.gov.voting_power(&addr("0x01"), &f.registry, &f.holdings, start());
        assert_eq!(power.balance, units(100));
        assert!(power.can_vote);
        let power = f.gov.voting_power(&addr("0x09"), &f.registry, &f.holdings, start());
        assert!(!power.verified);
        assert!(!power.can_vote);
        let power = f.gov.voting_power(&addr("0x04"), &f.registry, &f.holdings, start());
        assert!(power.verified);
        assert!(!power.can_vote);
    }
}
