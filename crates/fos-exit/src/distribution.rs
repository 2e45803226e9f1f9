//! # Distribution
//!
//! ## Redemption
//!
//! `redeem` is two-phase: retire the units, then pay. The payout is checked
//! against the settlement funds held before any unit is retired, and a
//! failed payment reinstates the retired units.

use serde::{Deserialize, Serialize};

use fos_core::{Address, BalanceSource, FosError, FosResult, PricePerUnit, SettlementAmount, UnitAmount};
use fos_ledger::{AssetLedger, SettlementAsset};

/// Basis points in one whole (100%).
pub const BASIS_POINTS: u128 = 10_000;

/// Read-only view of the distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionState {
    pub deposit_authorized: bool,
    pub proceeds_deposited: bool,
    pub total_proceeds: SettlementAmount,
    pub final_price_per_unit: PricePerUnit,
    pub total_redeemed: SettlementAmount,
    pub remaining_proceeds: SettlementAmount,
}

/// The exit distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitDistribution {
    authority: Address,
    /// Settlement account holding the deposited proceeds.
    account: Address,
    require_governance_approval: bool,
    deposit_authorized: bool,
    proceeds_deposited: bool,
    total_proceeds: SettlementAmount,
    final_price_per_unit: PricePerUnit,
    total_redeemed: SettlementAmount,
}

impl ExitDistribution {
    pub fn new(authority: Address, account: Address, require_governance_approval: bool) -> Self {
        Self {
            authority,
            account,
            require_governance_approval,
            deposit_authorized: false,
            proceeds_deposited: false,
            total_proceeds: SettlementAmount::ZERO,
            final_price_per_unit: PricePerUnit::ZERO,
            total_redeemed: SettlementAmount::ZERO,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn is_deposited(&self) -> bool {
        self.proceeds_deposited
    }

    pub fn is_deposit_authorized(&self) -> bool {
        self.deposit_authorized
    }

    pub fn total_proceeds(&self) -> SettlementAmount {
        self.total_proceeds
    }

    pub fn total_redeemed(&self) -> SettlementAmount {
        self.total_redeemed
    }

    /// `total_proceeds - total_redeemed`.
    pub fn remaining_proceeds(&self) -> SettlementAmount {
        self.total_proceeds.saturating_sub(self.total_redeemed)
    }

    /// Zero until proceeds are deposited.
    pub fn final_price_per_unit(&self) -> PricePerUnit {
        self.final_price_per_unit
    }

    /// Payout for `units` at the final price; zero before the deposit.
    pub fn calculate_redemption(&self, units: UnitAmount) -> FosResult<SettlementAmount> {
        if !self.proceeds_deposited {
            return Ok(SettlementAmount::ZERO);
        }
        self.final_price_per_unit.value_of(units)
    }

    /// Return on `initial_investment`, in basis points, if `holder` redeemed
    /// everything they hold now. Losses clamp to zero.
    pub fn calculate_return<B: BalanceSource + ?Sized>(
        &self,
        holder: &Address,
        initial_investment: SettlementAmount,
        ledger: &B,
    ) -> FosResult<u128> {
        initial_investment.require_positive()?;
        let final_value = self.calculate_redemption(ledger.balance_of(holder))?;
        if final_value <= initial_investment {
            return Ok(0);
        }
        let gain = final_value.checked_sub(initial_investment)?.raw();
        gain.checked_mul(BASIS_POINTS)
            .map(|scaled| scaled / initial_investment.raw())
            .ok_or_else(|| FosError::InvalidAmount(format!("return on {initial_investment} overflows")))
    }

    pub fn state(&self) -> DistributionState {
        DistributionState {
            deposit_authorized: self.deposit_authorized,
            proceeds_deposited: self.proceeds_deposited,
            total_proceeds: self.total_proceeds,
            final_price_per_unit: self.final_price_per_unit,
            total_redeemed: self.total_redeemed,
            remaining_proceeds: self.remaining_proceeds(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Allow a deposit. Applied by an executed exit-sale proposal.
    pub fn authorize_deposit(&mut self) -> FosResult<()> {
        if self.proceeds_deposited {
            return Err(FosError::AlreadyDeposited);
        }
        self.deposit_authorized = true;
        tracing::info!("exit deposit authorized");
        Ok(())
    }

    /// Pull `amount` of proceeds from the authority and fix the final price.
    ///
    /// Returns the final price per whole unit.
    pub fn deposit_proceeds<B: BalanceSource + ?Sized>(
        &mut self,
        caller: &Address,
        amount: SettlementAmount,
        ledger: &B,
        settlement: &mut dyn SettlementAsset,
    ) -> FosResult<PricePerUnit> {
        if caller != &self.authority {
            return Err(FosError::permission_denied(caller, "deposit proceeds"));
        }
        if self.proceeds_deposited {
            return Err(FosError::AlreadyDeposited);
        }
        if self.require_governance_approval && !self.deposit_authorized {
            return Err(FosError::permission_denied(
                caller,
                "deposit proceeds before an exit sale is approved",
            ));
        }
        amount.require_positive()?;
        let supply = ledger.total_supply();
        let price = PricePerUnit::from_proceeds(amount, supply)?;
        let approved = settlement.allowance(caller, &self.account);
        if approved < amount {
            return Err(FosError::InsufficientAllowance {
                owner: caller.clone(),
                spender: self.account.clone(),
                needed: amount.to_string(),
                approved: approved.to_string(),
            });
        }

        settlement.transfer_from(&self.account, caller, &self.account, amount)?;

        self.proceeds_deposited = true;
        self.total_proceeds = amount;
        self.final_price_per_unit = price;
        tracing::info!(amount = %amount, supply = %supply, price = %price, "exit proceeds deposited");
        Ok(price)
    }

    /// Retire `units` from `holder` and pay them out at the final price.
    ///
    /// Returns the settlement amount paid.
    pub fn redeem(
        &mut self,
        holder: &Address,
        units: UnitAmount,
        ledger: &mut AssetLedger,
        settlement: &mut dyn SettlementAsset,
    ) -> FosResult<SettlementAmount> {
        if !self.proceeds_deposited {
            return Err(FosError::NotYetDeposited);
        }
        units.require_positive()?;
        let balance = ledger.balance_of(holder);
        if balance < units {
            return Err(FosError::insufficient_balance(holder, units, balance));
        }
        let payout = self.calculate_redemption(units)?;
        if payout.is_zero() {
            return Err(FosError::InvalidAmount(format!(
                "{units} base units redeem for nothing"
            )));
        }
        let new_redeemed = self.total_redeemed.checked_add(payout)?;
        if new_redeemed > self.total_proceeds {
            return Err(FosError::InvalidAmount(format!(
                "payout {payout} exceeds remaining proceeds {}",
                self.remaining_proceeds()
            )));
        }
        let funds = settlement.balance_of(&self.account);
        if funds < payout {
            return Err(FosError::SettlementFailure(format!(
                "exit account holds {funds}, payout needs {payout}"
            )));
        }

        // Phase one: retire the units.
        ledger.debit_redemption(&self.account, holder, units)?;

        // Phase two: pay, or reinstate the units.
        if let Err(err) = settlement.transfer(&self.account, holder, payout) {
            if let Err(undo) = ledger.reinstate_redemption(&self.account, holder, units) {
                tracing::error!(%holder, units = %units, error = %undo, "redemption reinstatement failed");
            }
            return Err(err);
        }

        self.total_redeemed = new_redeemed;
        tracing::info!(%holder, units = %units, payout = %payout, "units redeemed");
        Ok(payout)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
