use std::collections::HashMap;

use super::{ConformingToken, Revert, RevertingToken};
use crate::error::LedgerError;
use crate::types::{AccountId, Amount};

/// How [`InMemoryAsset`] treats transfer calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Normal,
    /// Report success without moving anything.
    SilentNoop,
    /// Fail every transfer.
    Fail,
}

/// Fungible token held entirely in memory.
///
/// Implements both raw token shapes, so it can sit behind either gateway
/// adapter. Used by the simulator and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAsset {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
    mode: TransferMode,
}

impl InMemoryAsset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: TransferMode) {
        self.mode = mode;
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Fails without minting if the supply would exceed `Amount::MAX`.
    pub fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow("token supply"))?;
        // a balance never exceeds the supply, so this add cannot overflow
        *self.balances.entry(*to).or_insert(0) += amount;
        self.total_supply = total_supply;
        Ok(())
    }

    /// Remove up to `amount` from `from`; returns what was actually burned.
    pub fn burn(&mut self, from: &AccountId, amount: Amount) -> Amount {
        let balance = self.balances.entry(*from).or_insert(0);
        let burned = amount.min(*balance);
        *balance -= burned;
        self.total_supply -= burned;
        burned
    }

    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
    }

    fn move_funds(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), String> {
        match self.mode {
            TransferMode::Normal => {}
            TransferMode::SilentNoop => return Ok(()),
            TransferMode::Fail => return Err("transfers disabled".to_string()),
        }
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(format!(
                "insufficient balance: {from} holds {from_balance}, needs {amount}"
            ));
        }
        self.balances.insert(*from, from_balance - amount);
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), String> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(format!(
                "allowance exceeded: {spender} may move {allowed} from {from}, asked {amount}"
            ));
        }
        self.move_funds(from, to, amount)?;
        if self.mode == TransferMode::Normal && allowed != Amount::MAX {
            self.allowances.insert((*from, *spender), allowed - amount);
        }
        Ok(())
    }
}

impl ConformingToken for InMemoryAsset {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balance(account)
    }

    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount) -> bool {
        match self.move_funds(sender, to, amount) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(%reason, "in-memory transfer returned false");
                false
            }
        }
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> bool {
        match self.spend_allowance(spender, from, to, amount) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(%reason, "in-memory transfer_from returned false");
                false
            }
        }
    }
}

impl RevertingToken for InMemoryAsset {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balance(account)
    }

    fn transfer(
        &mut self,
        sender: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), Revert> {
        self.move_funds(sender, to, amount).map_err(Revert)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), Revert> {
        self.spend_allowance(spender, from, to, amount)
            .map_err(Revert)
    }
}
