//! # Settlement Asset
//!
//! The external stable token in which purchases are paid and exit proceeds
//! are distributed. Components only ever see it through [`SettlementAsset`];
//! the engine ships [`InMemorySettlement`] as the default implementation.
//!
//! Any failure reported through this trait is surfaced as
//! [`FosError::SettlementFailure`] so callers can run their compensating leg.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fos_core::{Address, FosError, FosResult, SettlementAmount};

/// The settlement token interface.
pub trait SettlementAsset: Send + Sync + std::fmt::Debug {
    /// Current balance of `address`.
    fn balance_of(&self, address: &Address) -> SettlementAmount;

    /// Move funds owned by `from`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: SettlementAmount)
        -> FosResult<()>;

    /// Move funds out of `from` against an allowance granted to `spender`.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: SettlementAmount,
    ) -> FosResult<()>;

    /// Set the allowance `owner` grants `spender`.
    fn approve(&mut self, owner: &Address, spender: &Address, amount: SettlementAmount);

    /// Remaining allowance.
    fn allowance(&self, owner: &Address, spender: &Address) -> SettlementAmount;
}

/// An in-memory 6-decimal stable token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemorySettlement {
    symbol: String,
    balances: BTreeMap<Address, SettlementAmount>,
    allowances: BTreeMap<Address, BTreeMap<Address, SettlementAmount>>,
}

impl InMemorySettlement {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Credit `to` with freshly created funds. Used to seed accounts.
    pub fn mint(&mut self, to: &Address, amount: SettlementAmount) -> FosResult<()> {
        let credited = self.balance(to).checked_add(amount)?;
        self.balances.insert(to.clone(), credited);
        tracing::debug!(%to, amount = %amount, symbol = %self.symbol, "settlement minted");
        Ok(())
    }

    /// Sum of all balances.
    pub fn total_issued(&self) -> SettlementAmount {
        self.balances.values().copied().sum()
    }

    fn balance(&self, address: &Address) -> SettlementAmount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn move_funds(
        &mut self,
        from: &Address,
        to: &Address,
        amount: SettlementAmount,
    ) -> FosResult<()> {
        let available = self.balance(from);
        if available < amount {
            return Err(FosError::SettlementFailure(format!(
                "{from} holds {available} {}, needs {amount}",
                self.symbol
            )));
        }
        if from == to {
            return Ok(());
        }
        let debited = available.checked_sub(amount)?;
        let credited = self.balance(to).checked_add(amount)?;
        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl SettlementAsset for InMemorySettlement {
    fn balance_of(&self, address: &Address) -> SettlementAmount {
        self.balance(address)
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: SettlementAmount,
    ) -> FosResult<()> {
        self.move_funds(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: SettlementAmount,
    ) -> FosResult<()> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(FosError::SettlementFailure(format!(
                "{spender} may move {approved} {} of {from}'s funds, needs {amount}",
                self.symbol
            )));
        }
        self.move_funds(from, to, amount)?;
        let remaining = approved.checked_sub(amount)?;
        self.approve(from, spender, remaining);
        Ok(())
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: SettlementAmount) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> SettlementAmount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or_default()
    }
}
