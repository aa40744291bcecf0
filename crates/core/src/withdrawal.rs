//! Withdrawal state machine.
//!
//! ```text
//! Requested ──► Validated ──► Settled ──► Paid
//!     │             │            │
//!     └─────────────┴────────────┴──► Rejected (no state change)
//! ```
//!
//! `Validated → Settled` picks the early or matured branch and settles the
//! record. `Settled → Paid` runs the solvency check and pushes the payout. A
//! failure after settlement reverts it, so callers only ever observe the
//! state before the request or the fully paid state.
//!
//! The ledger is mutated before the outbound transfer is issued. The gateway
//! only receives `&mut G`, so it has no path back into the ledger.

use serde::Serialize;

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::gateway::AssetGateway;
use crate::ledger::DepositRecord;
use crate::types::{AccountId, Amount, ElapsedTime, Principal, Timestamp};
use crate::vault::SavingsVault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WithdrawalKind {
    /// Before the minimum lock: principal minus penalty.
    Early,
    /// At or after the minimum lock: principal plus reward.
    Matured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WithdrawalPhase {
    Requested,
    Validated,
    Settled,
    Paid,
    Rejected,
}

/// Outcome a withdrawal would have at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalQuote {
    pub kind: WithdrawalKind,
    pub principal: Principal,
    pub elapsed: ElapsedTime,
    pub reward: Amount,
    pub penalty: Amount,
    pub payout: Amount,
}

/// Result of a completed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalReceipt {
    pub deposit_index: usize,
    #[serde(flatten)]
    pub quote: WithdrawalQuote,
}

impl<G: AssetGateway, C: Clock> SavingsVault<G, C> {
    /// Preview withdrawing `(user, index)` now. Nothing changes.
    pub fn quote_withdrawal(
        &self,
        user: &AccountId,
        index: usize,
    ) -> Result<WithdrawalQuote, LedgerError> {
        let record = self.ledger.get(user, index)?;
        if record.is_settled() {
            return Err(LedgerError::AlreadySettled { user: *user, index });
        }
        self.quote_record(record, self.clock.now())
    }

    fn quote_record(
        &self,
        record: &DepositRecord,
        now: Timestamp,
    ) -> Result<WithdrawalQuote, LedgerError> {
        let principal = record.principal();
        let elapsed = now.elapsed_since(record.deposited_at());

        if !self.rewards.is_matured(elapsed) {
            let penalty = self.penalties.calculate_penalty(principal)?;
            let payout = principal
                .get()
                .checked_sub(penalty)
                .ok_or(LedgerError::Overflow("early payout"))?;
            return Ok(WithdrawalQuote {
                kind: WithdrawalKind::Early,
                principal,
                elapsed,
                reward: 0,
                penalty,
                payout,
            });
        }

        let reward = self.rewards.calculate_reward(principal, elapsed)?;
        let payout = principal
            .get()
            .checked_add(reward)
            .ok_or(LedgerError::Overflow("matured payout"))?;
        Ok(WithdrawalQuote {
            kind: WithdrawalKind::Matured,
            principal,
            elapsed,
            reward,
            penalty: 0,
            payout,
        })
    }

    /// Withdraw deposit `index` of `user`, early or matured depending on age.
    pub fn withdraw(
        &mut self,
        user: AccountId,
        index: usize,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        let mut phase = WithdrawalPhase::Requested;
        tracing::trace!(%user, index, ?phase, "Withdrawal requested");

        let result = self.run_withdrawal(user, index, &mut phase);
        match &result {
            Ok(receipt) => {
                tracing::info!(
                    %user,
                    index,
                    kind = ?receipt.quote.kind,
                    payout = receipt.quote.payout,
                    reward = receipt.quote.reward,
                    penalty = receipt.quote.penalty,
                    "Withdrawal paid"
                );
            }
            Err(e @ (LedgerError::InsolventPool { .. } | LedgerError::TransferFailed(_))) => {
                tracing::warn!(%user, index, failed_in = ?phase, error = %e, "Withdrawal rolled back");
            }
            Err(e) => {
                tracing::debug!(%user, index, failed_in = ?phase, error = %e, "Withdrawal rejected");
            }
        }
        if result.is_err() {
            phase = WithdrawalPhase::Rejected;
            tracing::trace!(%user, index, ?phase, "Withdrawal finished");
        }
        result
    }

    fn run_withdrawal(
        &mut self,
        user: AccountId,
        index: usize,
        phase: &mut WithdrawalPhase,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        // Requested -> Validated
        let quote = self.quote_withdrawal(&user, index)?;
        *phase = WithdrawalPhase::Validated;
        tracing::trace!(%user, index, ?phase, kind = ?quote.kind, "Withdrawal validated");

        // Validated -> Settled
        let mut settlement = self.ledger.settle(&user, index)?;
        if quote.reward > 0 {
            if let Err(e) = self.ledger.credit_reward(&mut settlement, quote.reward) {
                self.ledger.revert(settlement);
                return Err(e);
            }
        }
        *phase = WithdrawalPhase::Settled;
        tracing::trace!(%user, index, ?phase, "Deposit settled");

        // Settled -> Paid
        let available = self.gateway.holdings();
        if available < quote.payout {
            self.ledger.revert(settlement);
            return Err(LedgerError::InsolventPool {
                required: quote.payout,
                available,
            });
        }
        if let Err(e) = self.gateway.push(&user, quote.payout) {
            self.ledger.revert(settlement);
            return Err(e.into());
        }
        *phase = WithdrawalPhase::Paid;
        tracing::trace!(%user, index, ?phase, "Payout delivered");

        self.emit(match quote.kind {
            WithdrawalKind::Early => LedgerEvent::EarlyWithdrawn {
                user,
                payout: quote.payout,
                penalty: quote.penalty,
                deposit_index: index,
            },
            WithdrawalKind::Matured => LedgerEvent::Withdrawn {
                user,
                principal: quote.principal,
                reward: quote.reward,
                deposit_index: index,
            },
        });

        Ok(WithdrawalReceipt {
            deposit_index: index,
            quote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SharedMockClock;
    use crate::config::VaultConfig;
    use crate::gateway::{InMemoryAsset, RevertingGateway, TransferMode};

    const OWNER: AccountId = AccountId::new([0xee; 32]);
    const CUSTODY: AccountId = AccountId::new([0xcc; 32]);
    const ALICE: AccountId = AccountId::new([1; 32]);

    type TestVault = SavingsVault<RevertingGateway<InMemoryAsset>, SharedMockClock>;

    /// Vault with `reserve` units of reward funding already in custody.
    fn make_vault(reserve: Amount) -> (TestVault, SharedMockClock) {
        let mut asset = InMemoryAsset::new();
        asset.mint(&ALICE, 10_000).unwrap();
        asset.approve(&ALICE, &CUSTODY, Amount::MAX);
        asset.mint(&CUSTODY, reserve).unwrap();
        let clock = SharedMockClock::new();
        let vault = SavingsVault::open(
            &VaultConfig::new(OWNER, CUSTODY),
            RevertingGateway::new(asset, CUSTODY),
            clock.clone(),
        )
        .unwrap();
        (vault, clock)
    }

    #[test]
    fn test_early_withdrawal_pays_principal_minus_penalty() {
        let (mut vault, clock) = make_vault(0);
        vault.deposit(ALICE, 1_000).unwrap();
        clock.advance(ElapsedTime::from_days(30));

        let receipt = vault.withdraw(ALICE, 0).unwrap();
        assert_eq!(receipt.quote.kind, WithdrawalKind::Early);
        assert_eq!(receipt.quote.penalty, 100);
        assert_eq!(receipt.quote.payout, 900);
        assert_eq!(vault.gateway().token().balance(&ALICE), 9_900);
        // penalty stays in the pool
        assert_eq!(vault.aggregate_stats().pool_balance, 100);
        assert_eq!(vault.aggregate_stats().total_locked, 0);
        assert_eq!(vault.aggregate_stats().total_rewards_paid, 0);
        assert_eq!(
            vault.events().last(),
            Some(&LedgerEvent::EarlyWithdrawn {
                user: ALICE,
                payout: 900,
                penalty: 100,
                deposit_index: 0,
            })
        );
    }

    #[test]
    fn test_matured_withdrawal_pays_reward() {
        let (mut vault, clock) = make_vault(1_000);
        vault.deposit(ALICE, 1_000).unwrap();
        clock.advance(ElapsedTime::from_days(60));

        let receipt = vault.withdraw(ALICE, 0).unwrap();
        assert_eq!(receipt.quote.kind, WithdrawalKind::Matured);
        assert_eq!(receipt.quote.reward, 20);
        assert_eq!(receipt.quote.payout, 1_020);
        assert_eq!(vault.aggregate_stats().total_rewards_paid, 20);
        assert_eq!(
            vault.events().last(),
            Some(&LedgerEvent::Withdrawn {
                user: ALICE,
                principal: Principal::new(1_000),
                reward: 20,
                deposit_index: 0,
            })
        );
    }

    #[test]
    fn test_second_withdrawal_is_already_settled() {
        let (mut vault, clock) = make_vault(1_000);
        vault.deposit(ALICE, 1_000).unwrap();
        clock.advance(ElapsedTime::from_days(90));
        vault.withdraw(ALICE, 0).unwrap();

        let balance = vault.gateway().token().balance(&ALICE);
        assert_eq!(
            vault.withdraw(ALICE, 0).unwrap_err(),
            LedgerError::AlreadySettled { user: ALICE, index: 0 }
        );
        assert_eq!(vault.gateway().token().balance(&ALICE), balance);
        assert_eq!(vault.events().len(), 2);
    }

    #[test]
    fn test_unfunded_reward_is_insolvent_and_rolled_back() {
        let (mut vault, clock) = make_vault(0);
        vault.deposit(ALICE, 1_000).unwrap();
        clock.advance(ElapsedTime::from_days(60));

        let err = vault.withdraw(ALICE, 0).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsolventPool {
                required: 1_020,
                available: 1_000
            }
        );
        let record = vault.ledger().get(&ALICE, 0).unwrap();
        assert!(!record.is_settled());
        assert_eq!(vault.aggregate_stats().total_locked, 1_000);
        assert_eq!(vault.aggregate_stats().total_rewards_paid, 0);
        assert!(vault.ledger().is_conserved());
    }

    #[test]
    fn test_reverting_payout_rolls_back_settlement() {
        let (mut vault, clock) = make_vault(1_000);
        vault.deposit(ALICE, 1_000).unwrap();
        clock.advance(ElapsedTime::from_days(60));
        vault.gateway_mut().token_mut().set_mode(TransferMode::Fail);

        let err = vault.withdraw(ALICE, 0).unwrap_err();
        assert!(matches!(err, LedgerError::TransferFailed(_)));
        assert!(!vault.ledger().get(&ALICE, 0).unwrap().is_settled());
        assert_eq!(vault.aggregate_stats().total_rewards_paid, 0);

        // once the token recovers the same deposit can still be withdrawn
        vault.gateway_mut().token_mut().set_mode(TransferMode::Normal);
        assert_eq!(vault.withdraw(ALICE, 0).unwrap().quote.payout, 1_020);
    }

    #[test]
    fn test_quote_matches_withdrawal() {
        let (mut vault, clock) = make_vault(1_000);
        vault.deposit(ALICE, 1_000).unwrap();
        clock.advance(ElapsedTime::from_days(90));

        let quote = vault.quote_withdrawal(&ALICE, 0).unwrap();
        assert_eq!(quote.payout, 1_030);
        assert_eq!(vault.withdraw(ALICE, 0).unwrap().quote, quote);
    }

    #[test]
    fn test_unknown_deposit_is_rejected() {
        let (mut vault, _) = make_vault(0);
        assert_eq!(
            vault.withdraw(ALICE, 3).unwrap_err(),
            LedgerError::InvalidDepositId { user: ALICE, index: 3 }
        );
    }
}
