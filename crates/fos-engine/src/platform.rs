//! # Platform
//!
//! The composed platform. Commands take `&mut self` and run to completion
//! before returning; wrap the platform in a
//! [`SharedPlatform`](crate::SharedPlatform) to serialize them across
//! threads.
//!
//! ## Command Shape
//!
//! Every command follows the same steps:
//!
//! 1. Read `now` from the clock, once.
//! 2. Call the owning component with explicit borrows of its collaborators.
//! 3. On failure, log at `warn`, count the rejection, and return the error.
//! 4. On success, append a [`LedgerEvent`](crate::LedgerEvent) and return.
//!
//! Components validate before they mutate, so step 3 never leaves a partial
//! effect behind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fos_compliance::{ComplianceRegistry, Identity};
use fos_core::{
    Address, Clock, CountryCode, FosError, FosResult, PricePerUnit, ProposalId, SettlementAmount,
    Timestamp, UnitAmount,
};
use fos_exit::{DistributionState, ExitDistribution};
use fos_governance::{
    GovernanceEngine, Proposal, ProposalExecutor, ProposalKind, ProposalPayload, ProposalStatus,
    VoteRecord, VotingPower,
};
use fos_ledger::{AssetLedger, InMemorySettlement, LedgerRoles, SettlementAsset, TokenMetadata};
use fos_offering::{OfferingState, PrimaryOffering};

use crate::config::PlatformConfig;
use crate::journal::{EventKind, Journal, LedgerEvent};

/// Aggregate view of the platform at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    pub at: Timestamp,
    pub metadata: TokenMetadata,
    pub total_supply: UnitAmount,
    pub max_supply: UnitAmount,
    pub holder_count: usize,
    pub verified_identities: usize,
    pub offering: OfferingState,
    pub distribution: DistributionState,
    pub proposal_count: usize,
    pub settlement_symbol: String,
    pub last_event_sequence: u64,
}

/// The composed platform.
#[derive(Debug)]
pub struct Platform {
    authority: Address,
    registry: ComplianceRegistry,
    ledger: AssetLedger,
    offering: PrimaryOffering,
    exit: ExitDistribution,
    governance: GovernanceEngine,
    settlement: InMemorySettlement,
    clock: Arc<dyn Clock>,
    journal: Journal,
}

impl Platform {
    /// Build a platform from validated configuration.
    pub fn new(config: &PlatformConfig, clock: Arc<dyn Clock>) -> FosResult<Self> {
        config.validate()?;
        let metadata = TokenMetadata {
            name: config.asset.name.clone(),
            symbol: config.asset.symbol.clone(),
            asset_name: config.asset.asset_name.clone(),
            creator: config.asset.creator.clone(),
            origin_year: config.asset.origin_year,
            initial_valuation: config.asset.initial_valuation,
            transfers_enabled: config.asset.transfers_enabled,
        };
        let roles = LedgerRoles {
            issuer: config.offering.account.clone(),
            redeemer: config.exit.account.clone(),
            governor: config.governance.account.clone(),
        };
        tracing::info!(
            symbol = %metadata.symbol,
            max_supply = %config.asset.max_supply,
            price = %config.offering.price_per_unit,
            "platform initialised"
        );
        Ok(Self {
            authority: config.authority.clone(),
            registry: ComplianceRegistry::new(config.authority.clone()),
            ledger: AssetLedger::new(metadata, roles, config.asset.max_supply),
            offering: PrimaryOffering::new(
                config.authority.clone(),
                config.offering.account.clone(),
                config.offering.price_per_unit,
                config.offering.unit_cap,
            ),
            exit: ExitDistribution::new(
                config.authority.clone(),
                config.exit.account.clone(),
                config.exit.require_governance_approval,
            ),
            governance: GovernanceEngine::new(
                config.authority.clone(),
                config.governance.voting_period_secs,
            ),
            settlement: InMemorySettlement::new(config.settlement.symbol.clone()),
            clock,
            journal: Journal::new(),
        })
    }

    // ── Component access ─────────────────────────────────────────────

    pub fn authority(&self) -> &Address {
        &self.authority
    }

    pub fn registry(&self) -> &ComplianceRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &AssetLedger {
        &self.ledger
    }

    pub fn offering(&self) -> &PrimaryOffering {
        &self.offering
    }

    pub fn exit(&self) -> &ExitDistribution {
        &self.exit
    }

    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    pub fn settlement(&self) -> &InMemorySettlement {
        &self.settlement
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_verified(&self, address: &Address) -> bool {
        self.registry.is_verified(address, self.now())
    }

    pub fn calculate_cost(&self, units: UnitAmount) -> FosResult<SettlementAmount> {
        self.offering.calculate_cost(units)
    }

    pub fn calculate_redemption(&self, units: UnitAmount) -> FosResult<SettlementAmount> {
        self.exit.calculate_redemption(units)
    }

    /// Return on `initial_investment` in basis points.
    pub fn calculate_return(
        &self,
        holder: &Address,
        initial_investment: SettlementAmount,
    ) -> FosResult<u128> {
        self.exit
            .calculate_return(holder, initial_investment, &self.ledger)
    }

    pub fn voting_power(&self, address: &Address) -> VotingPower {
        self.governance
            .voting_power(address, &self.registry, &self.ledger, self.now())
    }

    pub fn has_proposal_passed(&self, id: ProposalId) -> FosResult<bool> {
        self.governance.has_proposal_passed(id, self.now())
    }

    /// Journal entries after sequence `since`.
    pub fn events(&self, since: u64) -> &[LedgerEvent] {
        self.journal.since(since)
    }

    pub fn snapshot(&self) -> PlatformSnapshot {
        let now = self.now();
        PlatformSnapshot {
            at: now,
            metadata: self.ledger.metadata().clone(),
            total_supply: self.ledger.total_supply(),
            max_supply: self.ledger.max_supply(),
            holder_count: self.ledger.holders().filter(|(_, units)| !units.is_zero()).count(),
            verified_identities: self.registry.verified_count(now),
            offering: self.offering.state(),
            distribution: self.exit.state(),
            proposal_count: self.governance.proposal_count(),
            settlement_symbol: self.settlement.symbol().to_string(),
            last_event_sequence: self.journal.last_sequence(),
        }
    }

    /// Cross-component invariants. Returns every violation found; empty
    /// means the platform is consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let supply = self.ledger.total_supply();
        let sum = self.ledger.sum_of_balances();
        if sum != supply {
            violations.push(format!("balances sum to {sum}, total supply is {supply}"));
        }
        if supply > self.ledger.max_supply() {
            violations.push(format!(
                "total supply {supply} exceeds max supply {}",
                self.ledger.max_supply()
            ));
        }
        if self.offering.units_sold() > self.offering.unit_cap() {
            violations.push(format!(
                "units sold {} exceed cap {}",
                self.offering.units_sold(),
                self.offering.unit_cap()
            ));
        }
        if self.exit.total_redeemed() > self.exit.total_proceeds() {
            violations.push(format!(
                "redeemed {} exceeds proceeds {}",
                self.exit.total_redeemed(),
                self.exit.total_proceeds()
            ));
        }
        let offering_funds = self.settlement.balance_of(self.offering.account());
        if offering_funds < self.offering.settlement_held() {
            violations.push(format!(
                "offering holds {offering_funds}, owes {}",
                self.offering.settlement_held()
            ));
        }
        let exit_funds = self.settlement.balance_of(self.exit.account());
        if exit_funds < self.exit.remaining_proceeds() {
            violations.push(format!(
                "exit account holds {exit_funds}, owes {}",
                self.exit.remaining_proceeds()
            ));
        }
        violations
    }

    // ── Compliance commands ──────────────────────────────────────────

    pub fn add_identity(
        &mut self,
        caller: &Address,
        address: Address,
        expiry: Timestamp,
        country: CountryCode,
    ) -> FosResult<Identity> {
        let now = self.now();
        let result = self
            .registry
            .add_identity(caller, address, expiry, country, now)
            .cloned();
        let identity = observe("add_identity", caller, result)?;
        self.journal.append(
            now,
            EventKind::IdentityAdded {
                address: identity.address.clone(),
                expiry,
                country: identity.country.clone(),
            },
        );
        Ok(identity)
    }

    pub fn remove_identity(&mut self, caller: &Address, address: &Address) -> FosResult<()> {
        let now = self.now();
        let result = self.registry.remove_identity(caller, address);
        observe("remove_identity", caller, result)?;
        self.journal.append(
            now,
            EventKind::IdentityRemoved {
                address: address.clone(),
            },
        );
        Ok(())
    }

    pub fn renew_identity(
        &mut self,
        caller: &Address,
        address: &Address,
        new_expiry: Timestamp,
    ) -> FosResult<Identity> {
        let now = self.now();
        let result = self
            .registry
            .renew_identity(caller, address, new_expiry)
            .cloned();
        let identity = observe("renew_identity", caller, result)?;
        self.journal.append(
            now,
            EventKind::IdentityRenewed {
                address: address.clone(),
                expiry: new_expiry,
            },
        );
        Ok(identity)
    }

    // ── Ledger commands ──────────────────────────────────────────────

    /// Move `units` from the caller to `to`.
    pub fn transfer(&mut self, caller: &Address, to: &Address, units: UnitAmount) -> FosResult<()> {
        let now = self.now();
        let result = self.ledger.transfer(caller, to, units, &self.registry, now);
        observe("transfer", caller, result)?;
        self.journal.append(
            now,
            EventKind::UnitsTransferred {
                spender: None,
                from: caller.clone(),
                to: to.clone(),
                units,
            },
        );
        Ok(())
    }

    /// Let `spender` move up to `units` of the caller's balance.
    pub fn approve(&mut self, caller: &Address, spender: &Address, units: UnitAmount) -> FosResult<()> {
        let now = self.now();
        self.ledger.approve(caller, spender, units);
        observe("approve", caller, Ok(()))?;
        self.journal.append(
            now,
            EventKind::UnitAllowanceSet {
                owner: caller.clone(),
                spender: spender.clone(),
                units,
            },
        );
        Ok(())
    }

    /// Move `units` from `from` to `to` against the caller's allowance.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        units: UnitAmount,
    ) -> FosResult<()> {
        let now = self.now();
        let result = self
            .ledger
            .transfer_from(caller, from, to, units, &self.registry, now);
        observe("transfer_from", caller, result)?;
        self.journal.append(
            now,
            EventKind::UnitsTransferred {
                spender: Some(caller.clone()),
                from: from.clone(),
                to: to.clone(),
                units,
            },
        );
        Ok(())
    }

    // ── Offering commands ────────────────────────────────────────────

    /// Buy `units` for the caller. Returns the settlement amount charged.
    pub fn buy_tokens(&mut self, caller: &Address, units: UnitAmount) -> FosResult<SettlementAmount> {
        let now = self.now();
        let result = self.offering.buy_tokens(
            caller,
            units,
            &mut self.ledger,
            &self.registry,
            &mut self.settlement,
            now,
        );
        let cost = observe("buy_tokens", caller, result)?;
        self.journal.append(
            now,
            EventKind::UnitsPurchased {
                buyer: caller.clone(),
                units,
                cost,
            },
        );
        Ok(cost)
    }

    pub fn close_sale(&mut self, caller: &Address) -> FosResult<()> {
        let now = self.now();
        let result = self.offering.close_sale(caller);
        observe("close_sale", caller, result)?;
        self.journal.append(now, EventKind::SaleClosed);
        Ok(())
    }

    pub fn withdraw_funds(&mut self, caller: &Address, to: &Address) -> FosResult<SettlementAmount> {
        let now = self.now();
        let result = self.offering.withdraw_funds(caller, to, &mut self.settlement);
        let amount = observe("withdraw_funds", caller, result)?;
        self.journal.append(
            now,
            EventKind::FundsWithdrawn {
                to: to.clone(),
                amount,
            },
        );
        Ok(amount)
    }

    // ── Exit commands ────────────────────────────────────────────────

    /// Deposit exit proceeds and close the offering. Returns the final price.
    pub fn deposit_proceeds(
        &mut self,
        caller: &Address,
        amount: SettlementAmount,
    ) -> FosResult<PricePerUnit> {
        let now = self.now();
        let result = self
            .exit
            .deposit_proceeds(caller, amount, &self.ledger, &mut self.settlement);
        let price = observe("deposit_proceeds", caller, result)?;
        let was_active = self.offering.is_active();
        self.offering.close();
        self.journal.append(
            now,
            EventKind::ProceedsDeposited {
                amount,
                final_price_per_unit: price,
            },
        );
        if was_active {
            self.journal.append(now, EventKind::SaleClosed);
        }
        Ok(price)
    }

    /// Redeem `units` of the caller's balance. Returns the payout.
    pub fn redeem(&mut self, caller: &Address, units: UnitAmount) -> FosResult<SettlementAmount> {
        let now = self.now();
        let result = self
            .exit
            .redeem(caller, units, &mut self.ledger, &mut self.settlement);
        let payout = observe("redeem", caller, result)?;
        self.journal.append(
            now,
            EventKind::UnitsRedeemed {
                holder: caller.clone(),
                units,
                payout,
            },
        );
        Ok(payout)
    }

    // ── Governance commands ──────────────────────────────────────────

    pub fn create_proposal(
        &mut self,
        caller: &Address,
        kind: ProposalKind,
        description: &str,
        payload: &[u8],
    ) -> FosResult<Proposal> {
        let now = self.now();
        let result = self
            .governance
            .create_proposal(caller, kind, description, payload, &self.registry, &self.ledger, now)
            .cloned();
        let proposal = observe("create_proposal", caller, result)?;
        self.journal.append(
            now,
            EventKind::ProposalCreated {
                proposal_id: proposal.id,
                kind,
                proposer: caller.clone(),
            },
        );
        Ok(proposal)
    }

    pub fn vote(&mut self, caller: &Address, id: ProposalId, support: bool) -> FosResult<VoteRecord> {
        let now = self.now();
        let result = self
            .governance
            .vote(id, caller, support, &self.registry, &self.ledger, now)
            .cloned();
        let record = observe("vote", caller, result)?;
        self.journal.append(
            now,
            EventKind::VoteCast {
                proposal_id: id,
                voter: caller.clone(),
                support,
                weight: record.weight,
            },
        );
        Ok(record)
    }

    /// Execute a passing proposal. Anyone may trigger execution.
    pub fn execute_proposal(&mut self, caller: &Address, id: ProposalId) -> FosResult<Proposal> {
        let now = self.now();
        let governor = self.ledger.roles().governor.clone();
        let mut effects = Effects {
            ledger: &mut self.ledger,
            exit: &mut self.exit,
            governor: &governor,
        };
        let result = self
            .governance
            .execute_proposal(id, &mut effects, now)
            .cloned();
        let proposal = observe("execute_proposal", caller, result)?;
        self.journal.append(
            now,
            EventKind::ProposalExecuted {
                proposal_id: id,
                payload: proposal.payload,
            },
        );
        Ok(proposal)
    }

    /// Settle a closed proposal: execute on a passing tally, reject otherwise.
    pub fn finalize_proposal(&mut self, caller: &Address, id: ProposalId) -> FosResult<Proposal> {
        let now = self.now();
        let governor = self.ledger.roles().governor.clone();
        let mut effects = Effects {
            ledger: &mut self.ledger,
            exit: &mut self.exit,
            governor: &governor,
        };
        let result = self
            .governance
            .finalize_proposal(id, &mut effects, now)
            .cloned();
        let proposal = observe("finalize_proposal", caller, result)?;
        let kind = match proposal.status {
            ProposalStatus::Executed => EventKind::ProposalExecuted {
                proposal_id: id,
                payload: proposal.payload,
            },
            _ => EventKind::ProposalRejected { proposal_id: id },
        };
        self.journal.append(now, kind);
        Ok(proposal)
    }

    pub fn cancel_proposal(&mut self, caller: &Address, id: ProposalId) -> FosResult<Proposal> {
        let now = self.now();
        let result = self.governance.cancel_proposal(id, caller, now).cloned();
        let proposal = observe("cancel_proposal", caller, result)?;
        self.journal.append(
            now,
            EventKind::ProposalCancelled {
                proposal_id: id,
                by: caller.clone(),
            },
        );
        Ok(proposal)
    }

    // ── Settlement commands ──────────────────────────────────────────

    /// Let `spender` pull up to `amount` of the caller's settlement funds.
    pub fn settlement_approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: SettlementAmount,
    ) -> FosResult<()> {
        let now = self.now();
        self.settlement.approve(caller, spender, amount);
        observe("settlement_approve", caller, Ok(()))?;
        self.journal.append(
            now,
            EventKind::SettlementApproved {
                owner: caller.clone(),
                spender: spender.clone(),
                amount,
            },
        );
        Ok(())
    }

    /// Create settlement funds for `to`. Authority only.
    pub fn mint_settlement(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: SettlementAmount,
    ) -> FosResult<()> {
        let now = self.now();
        let result = if caller != &self.authority {
            Err(FosError::permission_denied(caller, "mint settlement funds"))
        } else {
            amount
                .require_positive()
                .and_then(|amount| self.settlement.mint(to, amount))
        };
        observe("mint_settlement", caller, result)?;
        self.journal.append(
            now,
            EventKind::SettlementMinted {
                to: to.clone(),
                amount,
            },
        );
        Ok(())
    }
}

// ─── Governance Effects ──────────────────────────────────────────────

/// The slice of the platform a proposal may change.
struct Effects<'a> {
    ledger: &'a mut AssetLedger,
    exit: &'a mut ExitDistribution,
    governor: &'a Address,
}

impl ProposalExecutor for Effects<'_> {
    fn apply(&mut self, proposal: &Proposal) -> FosResult<()> {
        match proposal.payload {
            ProposalPayload::TransferAuthorization { enabled } => {
                self.ledger.set_transfers_enabled(self.governor, enabled)
            }
            ProposalPayload::EmergencyPause => self.ledger.set_transfers_enabled(self.governor, false),
            ProposalPayload::ExitSale => self.exit.authorize_deposit(),
        }
    }
}

/// Count the outcome and log rejections.
fn observe<T>(command: &'static str, caller: &Address, result: FosResult<T>) -> FosResult<T> {
    match &result {
        Ok(_) => {
            metrics::counter!("fos_commands_total", "command" => command, "outcome" => "ok")
                .increment(1);
        }
        Err(err) => {
            metrics::counter!("fos_commands_total", "command" => command, "outcome" => err.kind())
                .increment(1);
            tracing::warn!(command, %caller, code = err.kind(), error = %err, "command rejected");
        }
    }
    result
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use fos_core::ManualClock;
    use fos_governance::DEFAULT_VOTING_PERIOD_SECS;

    use crate::config::{
        AssetConfig, ExitConfig, GovernanceConfig, OfferingConfig, SettlementConfig,
    };

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn units(n: u128) -> UnitAmount {
        UnitAmount::from_whole(n).unwrap()
    }

    fn usdc(n: u128) -> SettlementAmount {
        SettlementAmount::from_whole(n).unwrap()
    }

    fn authority() -> Address {
        addr("0xa0")
    }

    fn offering_account() -> Address {
        addr("0xb1")
    }

    fn exit_account() -> Address {
        addr("0xb2")
    }

    fn config() -> PlatformConfig {
        PlatformConfig {
            authority: authority(),
            asset: AssetConfig {
                name: "Nocturne Fractions".into(),
                symbol: "NOCT".into(),
                asset_name: "Nocturne in Blue".into(),
                creator: "A. Painter".into(),
                origin_year: 1921,
                initial_valuation: usdc(4_000_000),
                max_supply: units(2_000),
                transfers_enabled: false,
            },
            offering: OfferingConfig {
                price_per_unit: PricePerUnit::from_whole(2_000).unwrap(),
                unit_cap: units(2_000),
                account: offering_account(),
            },
            exit: ExitConfig {
                account: exit_account(),
                require_governance_approval: true,
            },
            governance: GovernanceConfig {
                account: addr("0xb3"),
                voting_period_secs: DEFAULT_VOTING_PERIOD_SECS,
            },
            settlement: SettlementConfig::default(),
        }
    }

    fn make_platform() -> (Platform, ManualClock) {
        let clock = ManualClock::new(Timestamp::parse("2026-01-01T00:00:00Z").unwrap());
        let platform = Platform::new(&config(), Arc::new(clock.clone())).unwrap();
        (platform, clock)
    }

    fn verify(p: &mut Platform, who: &Address) {
        let expiry = Timestamp::parse("2030-01-01T00:00:00Z").unwrap();
        p.add_identity(&authority(), who.clone(), expiry, CountryCode::parse("US").unwrap())
            .unwrap();
    }

    fn buy(p: &mut Platform, who: &Address, n: u128) {
        let cost = p.calculate_cost(units(n)).unwrap();
        p.mint_settlement(&authority(), who, cost).unwrap();
        p.settlement_approve(who, &offering_account(), cost).unwrap();
        p.buy_tokens(who, units(n)).unwrap();
    }

    fn pass_proposal(
        p: &mut Platform,
        clock: &ManualClock,
        proposer: &Address,
        kind: ProposalKind,
        payload: &[u8],
    ) -> Proposal {
        let id = p.create_proposal(proposer, kind, "motion", payload).unwrap().id;
        p.vote(proposer, id, true).unwrap();
        clock.advance_secs(DEFAULT_VOTING_PERIOD_SECS + 1).unwrap();
        p.execute_proposal(proposer, id).unwrap()
    }

    // ── lifecycle ────────────────────────────────────────────────────

    #[test]
    fn test_full_lifecycle_through_redemption() {
        let (mut p, clock) = make_platform();
        let alice = addr("0x01");
        let bob = addr("0x02");
        verify(&mut p, &alice);
        verify(&mut p, &bob);
        buy(&mut p, &alice, 1_200);
        buy(&mut p, &bob, 800);
        assert_eq!(p.offering().remaining_units(), UnitAmount::ZERO);

        let executed = pass_proposal(&mut p, &clock, &alice, ProposalKind::ExitSale, &[]);
        assert_eq!(executed.status, ProposalStatus::Executed);
        assert!(p.exit().is_deposit_authorized());

        p.mint_settlement(&authority(), &authority(), usdc(4_200_000)).unwrap();
        p.settlement_approve(&authority(), &exit_account(), usdc(4_200_000))
            .unwrap();
        let price = p.deposit_proceeds(&authority(), usdc(4_200_000)).unwrap();
        assert_eq!(price, PricePerUnit::from_whole(2_100).unwrap());
        assert!(!p.offering().is_active());

        assert_eq!(p.redeem(&bob, units(10)).unwrap(), usdc(21_000));
        assert!(p.check_invariants().is_empty(), "{:?}", p.check_invariants());
    }

    #[test]
    fn test_deposit_without_exit_sale_is_denied() {
        let (mut p, _clock) = make_platform();
        let alice = addr("0x01");
        verify(&mut p, &alice);
        buy(&mut p, &alice, 10);
        p.mint_settlement(&authority(), &authority(), usdc(100)).unwrap();
        p.settlement_approve(&authority(), &exit_account(), usdc(100))
            .unwrap();
        let err = p.deposit_proceeds(&authority(), usdc(100)).unwrap_err();
        assert_eq!(err.kind(), "PERMISSION_DENIED");
        assert!(p.offering().is_active());
    }

    #[test]
    fn test_transfer_authorization_proposal_enables_transfers() {
        let (mut p, clock) = make_platform();
        let alice = addr("0x01");
        let bob = addr("0x02");
        verify(&mut p, &alice);
        verify(&mut p, &bob);
        buy(&mut p, &alice, 10);
        assert_eq!(
            p.transfer(&alice, &bob, units(1)).unwrap_err(),
            FosError::TransfersRestricted
        );
        let payload = ProposalPayload::TransferAuthorization { enabled: true }.encode();
        pass_proposal(&mut p, &clock, &alice, ProposalKind::TransferAuthorization, &payload);
        p.transfer(&alice, &bob, units(1)).unwrap();
        assert_eq!(p.ledger().balance_of(&bob), units(1));
    }

    #[test]
    fn test_emergency_pause_suspends_transfers() {
        let (mut p, clock) = make_platform();
        let alice = addr("0x01");
        let bob = addr("0x02");
        verify(&mut p, &alice);
        verify(&mut p, &bob);
        buy(&mut p, &alice, 10);
        let payload = ProposalPayload::TransferAuthorization { enabled: true }.encode();
        pass_proposal(&mut p, &clock, &alice, ProposalKind::TransferAuthorization, &payload);
        pass_proposal(&mut p, &clock, &alice, ProposalKind::EmergencyPause, &[]);
        assert!(!p.ledger().transfers_enabled());
        assert_eq!(
            p.transfer(&alice, &bob, units(1)).unwrap_err(),
            FosError::TransfersRestricted
        );
    }

    #[test]
    fn test_second_exit_sale_after_deposit_fails_atomically() {
        let (mut p, clock) = make_platform();
        let alice = addr("0x01");
        verify(&mut p, &alice);
        buy(&mut p, &alice, 10);
        pass_proposal(&mut p, &clock, &alice, ProposalKind::ExitSale, &[]);
        p.mint_settlement(&authority(), &authority(), usdc(30_000)).unwrap();
        p.settlement_approve(&authority(), &exit_account(), usdc(30_000))
            .unwrap();
        p.deposit_proceeds(&authority(), usdc(30_000)).unwrap();

        let id = p
            .create_proposal(&alice, ProposalKind::ExitSale, "again", &[])
            .unwrap()
            .id;
        p.vote(&alice, id, true).unwrap();
        clock.advance_secs(DEFAULT_VOTING_PERIOD_SECS + 1).unwrap();
        assert_eq!(
            p.execute_proposal(&alice, id).unwrap_err(),
            FosError::AlreadyDeposited
        );
        assert_eq!(
            p.governance().get_proposal(id).unwrap().status,
            ProposalStatus::Active
        );
    }

    #[test]
    fn test_finalize_records_rejection() {
        let (mut p, clock) = make_platform();
        let alice = addr("0x01");
        let bob = addr("0x02");
        verify(&mut p, &alice);
        verify(&mut p, &bob);
        buy(&mut p, &alice, 10);
        buy(&mut p, &bob, 20);
        let id = p
            .create_proposal(&alice, ProposalKind::ExitSale, "sell", &[])
            .unwrap()
            .id;
        p.vote(&alice, id, true).unwrap();
        p.vote(&bob, id, false).unwrap();
        clock.advance_secs(DEFAULT_VOTING_PERIOD_SECS + 1).unwrap();
        let proposal = p.finalize_proposal(&bob, id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);
        match &p.events(0).last().unwrap().kind {
            EventKind::ProposalRejected { proposal_id } => assert_eq!(*proposal_id, id),
            other => panic!("Expected ProposalRejected, got: {other:?}"),
        }
    }

    // ── journal ──────────────────────────────────────────────────────

    #[test]
    fn test_rejected_commands_leave_no_event() {
        let (mut p, _clock) = make_platform();
        let before = p.snapshot().last_event_sequence;
        assert!(p.buy_tokens(&addr("0x09"), units(1)).is_err());
        assert!(p.close_sale(&addr("0x09")).is_err());
        assert_eq!(p.snapshot().last_event_sequence, before);
    }

    #[test]
    fn test_mint_is_authority_only() {
        let (mut p, _clock) = make_platform();
        let err = p
            .mint_settlement(&addr("0x01"), &addr("0x01"), usdc(1))
            .unwrap_err();
        assert_eq!(err.kind(), "PERMISSION_DENIED");
        let err = p
            .mint_settlement(&authority(), &addr("0x01"), SettlementAmount::ZERO)
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_AMOUNT");
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let (mut p, _clock) = make_platform();
        let alice = addr("0x01");
        verify(&mut p, &alice);
        buy(&mut p, &alice, 25);
        let snap = p.snapshot();
        assert_eq!(snap.total_supply, units(25));
        assert_eq!(snap.holder_count, 1);
        assert_eq!(snap.verified_identities, 1);
        assert_eq!(snap.offering.units_sold, units(25));
        assert_eq!(snap.settlement_symbol, "USDC");
        assert_eq!(snap.last_event_sequence, p.events(0).len() as u64);
    }

    #[test]
    fn test_expiry_is_evaluated_lazily() {
        let (mut p, clock) = make_platform();
        let alice = addr("0x01");
        verify(&mut p, &alice);
        assert!(p.is_verified(&alice));
        clock.set(Timestamp::parse("2030-01-01T00:00:00Z").unwrap());
        assert!(!p.is_verified(&alice));
        let err = p.buy_tokens(&alice, units(1)).unwrap_err();
        assert_eq!(err, FosError::NotVerified(alice.clone()));
    }
}
