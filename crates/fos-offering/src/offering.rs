//! # Primary Offering
//!
//! ## Purchase
//!
//! `buy_tokens` is two-phase: settlement pull, then unit issuance. Every
//! precondition of both legs is checked before the pull. If issuance still
//! fails, the pulled funds are returned and the buyer's allowance is
//! restored before the original error is reported.

use serde::{Deserialize, Serialize};

use fos_core::{
    Address, ComplianceOracle, FosError, FosResult, PricePerUnit, SettlementAmount, Timestamp,
    UnitAmount,
};
use fos_ledger::{AssetLedger, SettlementAsset};

/// Read-only view of the offering, as served to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferingState {
    pub price_per_unit: PricePerUnit,
    pub unit_cap: UnitAmount,
    pub units_sold: UnitAmount,
    pub remaining_units: UnitAmount,
    pub active: bool,
    pub settlement_held: SettlementAmount,
}

/// The primary offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryOffering {
    authority: Address,
    /// Settlement account that receives purchase funds and issues units.
    account: Address,
    price_per_unit: PricePerUnit,
    unit_cap: UnitAmount,
    units_sold: UnitAmount,
    active: bool,
    settlement_held: SettlementAmount,
}

impl PrimaryOffering {
    /// Open an offering. Starts active with nothing sold.
    pub fn new(
        authority: Address,
        account: Address,
        price_per_unit: PricePerUnit,
        unit_cap: UnitAmount,
    ) -> Self {
        Self {
            authority,
            account,
            price_per_unit,
            unit_cap,
            units_sold: UnitAmount::ZERO,
            active: true,
            settlement_held: SettlementAmount::ZERO,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Settlement cost of `units`, floored to the settlement precision.
    pub fn calculate_cost(&self, units: UnitAmount) -> FosResult<SettlementAmount> {
        self.price_per_unit.value_of(units)
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn price_per_unit(&self) -> PricePerUnit {
        self.price_per_unit
    }

    pub fn unit_cap(&self) -> UnitAmount {
        self.unit_cap
    }

    pub fn units_sold(&self) -> UnitAmount {
        self.units_sold
    }

    /// `unit_cap - units_sold`.
    pub fn remaining_units(&self) -> UnitAmount {
        self.unit_cap.saturating_sub(self.units_sold)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Purchase funds received and not yet withdrawn.
    pub fn settlement_held(&self) -> SettlementAmount {
        self.settlement_held
    }

    pub fn state(&self) -> OfferingState {
        OfferingState {
            price_per_unit: self.price_per_unit,
            unit_cap: self.unit_cap,
            units_sold: self.units_sold,
            remaining_units: self.remaining_units(),
            active: self.active,
            settlement_held: self.settlement_held,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Subscribe `buyer` to `units`, paying [`calculate_cost`](Self::calculate_cost).
    ///
    /// Returns the settlement amount charged.
    pub fn buy_tokens<C: ComplianceOracle + ?Sized>(
        &mut self,
        buyer: &Address,
        units: UnitAmount,
        ledger: &mut AssetLedger,
        compliance: &C,
        settlement: &mut dyn SettlementAsset,
        now: Timestamp,
    ) -> FosResult<SettlementAmount> {
        if !self.active {
            return Err(FosError::SaleInactive);
        }
        units.require_positive()?;
        if !compliance.is_verified(buyer, now) {
            return Err(FosError::NotVerified(buyer.clone()));
        }
        let new_sold = self.units_sold.checked_add(units)?;
        if new_sold > self.unit_cap {
            return Err(FosError::CapExceeded {
                requested: units.to_string(),
                remaining: self.remaining_units().to_string(),
            });
        }
        let headroom = ledger.max_supply().saturating_sub(ledger.total_supply());
        if units > headroom {
            return Err(FosError::CapExceeded {
                requested: units.to_string(),
                remaining: headroom.to_string(),
            });
        }
        let cost = self.calculate_cost(units)?;
        if cost.is_zero() {
            return Err(FosError::InvalidAmount(format!(
                "{units} base units cost nothing at {} per unit",
                self.price_per_unit
            )));
        }
        let approved = settlement.allowance(buyer, &self.account);
        if approved < cost {
            return Err(FosError::InsufficientAllowance {
                owner: buyer.clone(),
                spender: self.account.clone(),
                needed: cost.to_string(),
                approved: approved.to_string(),
            });
        }
        let funds = settlement.balance_of(buyer);
        if funds < cost {
            return Err(FosError::insufficient_balance(buyer, cost, funds));
        }
        let new_held = self.settlement_held.checked_add(cost)?;

        // Phase one: pull the purchase funds.
        settlement.transfer_from(&self.account, buyer, &self.account, cost)?;

        // Phase two: issue the units, or give the funds back.
        if let Err(err) = ledger.credit_issuance(&self.account, buyer, units) {
            self.refund(buyer, cost, approved, settlement);
            return Err(err);
        }

        self.units_sold = new_sold;
        self.settlement_held = new_held;
        tracing::info!(%buyer, units = %units, cost = %cost, sold = %new_sold, "units purchased");
        Ok(cost)
    }

    /// End the sale. Authority only; irreversible.
    pub fn close_sale(&mut self, caller: &Address) -> FosResult<()> {
        self.require_authority(caller, "close sale")?;
        if !self.active {
            return Err(FosError::SaleInactive);
        }
        self.close();
        Ok(())
    }

    /// End the sale without a caller check. Used when exit proceeds are
    /// deposited; a no-op when already closed.
    pub fn close(&mut self) {
        if self.active {
            self.active = false;
            tracing::info!(sold = %self.units_sold, "offering closed");
        }
    }

    /// Send all held purchase funds to `to`. Authority only.
    pub fn withdraw_funds(
        &mut self,
        caller: &Address,
        to: &Address,
        settlement: &mut dyn SettlementAsset,
    ) -> FosResult<SettlementAmount> {
        self.require_authority(caller, "withdraw funds")?;
        let amount = self.settlement_held;
        if amount.is_zero() {
            return Err(FosError::InvalidAmount("no purchase funds held".into()));
        }
        settlement.transfer(&self.account, to, amount)?;
        self.settlement_held = SettlementAmount::ZERO;
        tracing::info!(%to, amount = %amount, "purchase funds withdrawn");
        Ok(amount)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn refund(
        &self,
        buyer: &Address,
        cost: SettlementAmount,
        approved: SettlementAmount,
        settlement: &mut dyn SettlementAsset,
    ) {
        match settlement.transfer(&self.account, buyer, cost) {
            Ok(()) => {
                settlement.approve(buyer, &self.account, approved);
                tracing::warn!(%buyer, cost = %cost, "purchase rolled back");
            }
            Err(err) => {
                tracing::error!(%buyer, cost = %cost, error = %err, "purchase refund failed");
            }
        }
    }

    fn require_authority(&self, caller: &Address, action: &str) -> FosResult<()> {
        if caller != &self.authority {
            return Err(FosError::permission_denied(caller, action));
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
