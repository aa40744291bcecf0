//! Deposit records and the aggregate counters derived from them.
//!
//! [`DepositLedger`] is the sole writer of records and counters. Records are
//! append-only per owner and never removed; a withdrawal only flips `settled`.
//! Once settled, a record's principal counts as zero in every aggregate even
//! though the historical value stays readable.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::LedgerError;
use crate::gateway::AssetGateway;
use crate::types::{AccountId, Amount, Principal, Timestamp};

/// One deposit, identified by `(owner, index)` within the owner's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRecord {
    principal: Principal,
    deposited_at: Timestamp,
    settled: bool,
}

impl DepositRecord {
    /// Historical principal, retained after settlement for display.
    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn deposited_at(&self) -> Timestamp {
        self.deposited_at
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Principal still backing the user's balance: zero once settled.
    pub fn live_principal(&self) -> Amount {
        if self.settled {
            0
        } else {
            self.principal.get()
        }
    }
}

/// Proof that a record was settled. Handed back to [`DepositLedger::revert`]
/// when the payout that follows cannot complete.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a settlement must be paid out or reverted"]
pub struct Settlement {
    user: AccountId,
    index: usize,
    principal: Principal,
    deposited_at: Timestamp,
    reward_credited: Amount,
}

impl Settlement {
    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn deposited_at(&self) -> Timestamp {
        self.deposited_at
    }
}

#[derive(Debug, Default)]
pub struct DepositLedger {
    records: HashMap<AccountId, Vec<DepositRecord>>,
    total_by_user: HashMap<AccountId, Amount>,
    total_locked: Amount,
    total_rewards_paid: Amount,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive `principal` from `user` through `gateway`, then record it.
    ///
    /// Returns the new record's index in the user's sequence. Counters are
    /// checked for overflow before any funds move.
    pub fn deposit<G: AssetGateway>(
        &mut self,
        gateway: &mut G,
        user: AccountId,
        principal: Principal,
        now: Timestamp,
    ) -> Result<usize, LedgerError> {
        if principal.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let user_total = self
            .total_deposited_by(&user)
            .checked_add(principal.get())
            .ok_or(LedgerError::Overflow("user total"))?;
        let total_locked = self
            .total_locked
            .checked_add(principal.get())
            .ok_or(LedgerError::Overflow("total locked"))?;

        gateway.pull(&user, principal.get())?;

        let records = self.records.entry(user).or_default();
        records.push(DepositRecord {
            principal,
            deposited_at: now,
            settled: false,
        });
        self.total_by_user.insert(user, user_total);
        self.total_locked = total_locked;

        Ok(records.len() - 1)
    }

    pub fn get(&self, user: &AccountId, index: usize) -> Result<&DepositRecord, LedgerError> {
        self.records
            .get(user)
            .and_then(|records| records.get(index))
            .ok_or(LedgerError::InvalidDepositId { user: *user, index })
    }

    /// Mark `(user, index)` settled and release its principal from the totals.
    pub fn settle(&mut self, user: &AccountId, index: usize) -> Result<Settlement, LedgerError> {
        let record = self.get(user, index)?;
        if record.settled {
            return Err(LedgerError::AlreadySettled { user: *user, index });
        }
        let principal = record.principal;
        let deposited_at = record.deposited_at;

        let user_total = self
            .total_deposited_by(user)
            .checked_sub(principal.get())
            .ok_or(LedgerError::Overflow("user total"))?;
        let total_locked = self
            .total_locked
            .checked_sub(principal.get())
            .ok_or(LedgerError::Overflow("total locked"))?;

        if let Some(record) = self
            .records
            .get_mut(user)
            .and_then(|records| records.get_mut(index))
        {
            record.settled = true;
        }
        self.total_by_user.insert(*user, user_total);
        self.total_locked = total_locked;

        Ok(Settlement {
            user: *user,
            index,
            principal,
            deposited_at,
            reward_credited: 0,
        })
    }

    /// Count `reward` as paid against an open settlement.
    pub fn credit_reward(
        &mut self,
        settlement: &mut Settlement,
        reward: Amount,
    ) -> Result<(), LedgerError> {
        self.total_rewards_paid = self
            .total_rewards_paid
            .checked_add(reward)
            .ok_or(LedgerError::Overflow("total rewards paid"))?;
        settlement.reward_credited += reward;
        Ok(())
    }

    /// Undo a settlement whose payout failed, restoring the exact prior state.
    pub fn revert(&mut self, settlement: Settlement) {
        let Settlement {
            user,
            index,
            principal,
            reward_credited,
            ..
        } = settlement;

        if let Some(record) = self
            .records
            .get_mut(&user)
            .and_then(|records| records.get_mut(index))
        {
            record.settled = false;
        }
        // re-adding what settle just subtracted cannot overflow
        *self.total_by_user.entry(user).or_insert(0) += principal.get();
        self.total_locked += principal.get();
        self.total_rewards_paid -= reward_credited;
    }

    pub fn deposit_count(&self, user: &AccountId) -> usize {
        self.records.get(user).map_or(0, Vec::len)
    }

    /// All of `user`'s records in index order, settled ones included.
    pub fn deposits_of(&self, user: &AccountId) -> &[DepositRecord] {
        self.records.get(user).map(Vec::as_slice).unwrap_or_default()
    }

    /// Sum of principal over the user's unsettled records.
    pub fn total_deposited_by(&self, user: &AccountId) -> Amount {
        self.total_by_user.get(user).copied().unwrap_or(0)
    }

    pub fn total_locked(&self) -> Amount {
        self.total_locked
    }

    pub fn total_rewards_paid(&self) -> Amount {
        self.total_rewards_paid
    }

    /// Recompute both conservation invariants from the records.
    ///
    /// `total_locked == Σ total_deposited_by(u)` and
    /// `total_deposited_by(u) == Σ live principal of u's records`.
    pub fn is_conserved(&self) -> bool {
        let mut locked: Amount = 0;
        for (user, records) in &self.records {
            let live: Amount = records.iter().map(DepositRecord::live_principal).sum();
            if live != self.total_deposited_by(user) {
                tracing::warn!(%user, live, recorded = self.total_deposited_by(user), "user total drifted");
                return false;
            }
            locked += live;
        }
        let by_user: Amount = self.total_by_user.values().sum();
        locked == self.total_locked && by_user == self.total_locked
    }
}
