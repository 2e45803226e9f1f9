//! # Asset Ledger
//!
//! Unit balances for the single tokenized asset.
//!
//! ## Gates
//!
//! A holder-to-holder movement (`transfer`, `transfer_from`) passes, in order:
//!
//! 1. amount > 0
//! 2. `metadata.transfers_enabled`
//! 3. sender compliant, then recipient compliant
//! 4. sender balance ≥ amount
//! 5. (`transfer_from` only) allowance ≥ amount
//!
//! Only after every gate passes is any map touched, so a rejected command
//! leaves the ledger untouched.
//!
//! ## Roles
//!
//! Issuance and redemption are not holder operations. They bypass the
//! transfer gates but are restricted to the accounts named in
//! [`LedgerRoles`]: the offering mints, the exit distribution burns, and
//! governance toggles transfers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fos_core::{
    Address, BalanceSource, ComplianceOracle, FosError, FosResult, Timestamp, UnitAmount,
};

use crate::metadata::TokenMetadata;

/// Accounts allowed to perform privileged ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRoles {
    /// May call [`AssetLedger::credit_issuance`] (the primary offering).
    pub issuer: Address,
    /// May call [`AssetLedger::debit_redemption`] (the exit distribution).
    pub redeemer: Address,
    /// May call [`AssetLedger::set_transfers_enabled`] (governance).
    pub governor: Address,
}

/// The asset ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLedger {
    metadata: TokenMetadata,
    roles: LedgerRoles,
    max_supply: UnitAmount,
    total_supply: UnitAmount,
    balances: BTreeMap<Address, UnitAmount>,
    allowances: BTreeMap<Address, BTreeMap<Address, UnitAmount>>,
}

impl AssetLedger {
    /// Create an empty ledger that can never hold more than `max_supply`.
    pub fn new(metadata: TokenMetadata, roles: LedgerRoles, max_supply: UnitAmount) -> Self {
        Self {
            metadata,
            roles,
            max_supply,
            total_supply: UnitAmount::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current balance; zero for addresses never credited.
    pub fn balance_of(&self, address: &Address) -> UnitAmount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    /// Units currently outstanding.
    pub fn total_supply(&self) -> UnitAmount {
        self.total_supply
    }

    /// Upper bound on issuance.
    pub fn max_supply(&self) -> UnitAmount {
        self.max_supply
    }

    /// Token metadata.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Privileged accounts.
    pub fn roles(&self) -> &LedgerRoles {
        &self.roles
    }

    /// Whether holder-to-holder transfers are currently allowed.
    pub fn transfers_enabled(&self) -> bool {
        self.metadata.transfers_enabled
    }

    /// Amount `spender` may still move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> UnitAmount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or_default()
    }

    /// Compliance gate, delegated to the registry.
    pub fn is_compliant<C: ComplianceOracle + ?Sized>(
        &self,
        address: &Address,
        compliance: &C,
        now: Timestamp,
    ) -> bool {
        compliance.is_verified(address, now)
    }

    /// Every address ever credited, with its balance, ordered by address.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, UnitAmount)> {
        self.balances.iter().map(|(address, units)| (address, *units))
    }

    /// Recompute `Σ balances` for invariant checks.
    pub fn sum_of_balances(&self) -> UnitAmount {
        self.balances.values().copied().sum()
    }

    // ── Holder commands ──────────────────────────────────────────────

    /// Move `amount` from `from` to `to`.
    pub fn transfer<C: ComplianceOracle + ?Sized>(
        &mut self,
        from: &Address,
        to: &Address,
        amount: UnitAmount,
        compliance: &C,
        now: Timestamp,
    ) -> FosResult<()> {
        self.check_movement(from, to, amount, compliance, now)?;
        self.apply_movement(from, to, amount)?;
        tracing::info!(%from, %to, units = %amount, "units transferred");
        Ok(())
    }

    /// Authorize `spender` to move up to `amount` of `owner`'s units.
    ///
    /// Replaces any previous allowance. Approving zero clears it.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: UnitAmount) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        tracing::info!(%owner, %spender, units = %amount, "unit allowance set");
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    pub fn transfer_from<C: ComplianceOracle + ?Sized>(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: UnitAmount,
        compliance: &C,
        now: Timestamp,
    ) -> FosResult<()> {
        self.check_movement(from, to, amount, compliance, now)?;
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(FosError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount.to_string(),
                approved: approved.to_string(),
            });
        }
        let remaining = approved.checked_sub(amount)?;
        self.apply_movement(from, to, amount)?;
        self.allowances
            .entry(from.clone())
            .or_default()
            .insert(spender.clone(), remaining);
        tracing::info!(%spender, %from, %to, units = %amount, "units transferred by spender");
        Ok(())
    }

    // ── Privileged commands ──────────────────────────────────────────

    /// Mint `amount` new units to `to`. Issuer only.
    pub fn credit_issuance(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: UnitAmount,
    ) -> FosResult<()> {
        if caller != &self.roles.issuer {
            return Err(FosError::permission_denied(caller, "issue units"));
        }
        amount.require_positive()?;
        let new_supply = self.total_supply.checked_add(amount)?;
        if new_supply > self.max_supply {
            return Err(FosError::CapExceeded {
                requested: amount.to_string(),
                remaining: self.max_supply.saturating_sub(self.total_supply).to_string(),
            });
        }
        let new_balance = self.balance_of(to).checked_add(amount)?;
        self.balances.insert(to.clone(), new_balance);
        self.total_supply = new_supply;
        tracing::info!(%to, units = %amount, supply = %new_supply, "units issued");
        Ok(())
    }

    /// Retire `amount` units held by `from`. Redeemer only.
    pub fn debit_redemption(
        &mut self,
        caller: &Address,
        from: &Address,
        amount: UnitAmount,
    ) -> FosResult<()> {
        if caller != &self.roles.redeemer {
            return Err(FosError::permission_denied(caller, "redeem units"));
        }
        amount.require_positive()?;
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(FosError::insufficient_balance(from, amount, balance));
        }
        let new_balance = balance.checked_sub(amount)?;
        let new_supply = self.total_supply.checked_sub(amount)?;
        self.balances.insert(from.clone(), new_balance);
        self.total_supply = new_supply;
        tracing::info!(%from, units = %amount, supply = %new_supply, "units retired");
        Ok(())
    }

    /// Undo a [`debit_redemption`](Self::debit_redemption) whose payout leg
    /// failed. Redeemer only; restores both the balance and the supply.
    pub fn reinstate_redemption(
        &mut self,
        caller: &Address,
        holder: &Address,
        amount: UnitAmount,
    ) -> FosResult<()> {
        if caller != &self.roles.redeemer {
            return Err(FosError::permission_denied(caller, "reinstate units"));
        }
        let new_balance = self.balance_of(holder).checked_add(amount)?;
        let new_supply = self.total_supply.checked_add(amount)?;
        self.balances.insert(holder.clone(), new_balance);
        self.total_supply = new_supply;
        tracing::warn!(%holder, units = %amount, "redemption reversed");
        Ok(())
    }

    /// Enable or suspend holder-to-holder transfers. Governor only.
    pub fn set_transfers_enabled(&mut self, caller: &Address, enabled: bool) -> FosResult<()> {
        if caller != &self.roles.governor {
            return Err(FosError::permission_denied(caller, "toggle transfers"));
        }
        self.metadata.transfers_enabled = enabled;
        tracing::info!(enabled, "transfer authorization changed");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn check_movement<C: ComplianceOracle + ?Sized>(
        &self,
        from: &Address,
        to: &Address,
        amount: UnitAmount,
        compliance: &C,
        now: Timestamp,
    ) -> FosResult<()> {
        amount.require_positive()?;
        if !self.metadata.transfers_enabled {
            return Err(FosError::TransfersRestricted);
        }
        if !compliance.is_verified(from, now) {
            return Err(FosError::NotVerified(from.clone()));
        }
        if !compliance.is_verified(to, now) {
            return Err(FosError::NotVerified(to.clone()));
        }
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(FosError::insufficient_balance(from, amount, balance));
        }
        Ok(())
    }

    fn apply_movement(&mut self, from: &Address, to: &Address, amount: UnitAmount) -> FosResult<()> {
        if from == to {
            return Ok(());
        }
        let debited = self.balance_of(from).checked_sub(amount)?;
        let credited = self.balance_of(to).checked_add(amount)?;
        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl BalanceSource for AssetLedger {
    fn balance_of(&self, address: &Address) -> UnitAmount {
        AssetLedger::balance_of(self, address)
    }

    fn total_supply(&self) -> UnitAmount {
        AssetLedger::total_supply(self)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
