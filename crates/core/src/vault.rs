//! The savings vault: ledger, engines, gateway and clock wired together.
//!
//! Deposits and queries live here; the withdrawal state machine is in
//! `withdrawal.rs` and the owner-gated operations in `admin.rs`.

use serde::Serialize;

use crate::clock::Clock;
use crate::config::{ConfigError, VaultConfig};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::gateway::AssetGateway;
use crate::ledger::{DepositLedger, DepositRecord};
use crate::penalty::PenaltyEngine;
use crate::reward::RewardEngine;
use crate::types::{AccountId, Amount, Principal, Timestamp};

/// Read-only view of one deposit, as of now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositInfo {
    pub principal: Principal,
    pub deposited_at: Timestamp,
    pub settled: bool,
    /// Reward a withdrawal right now would pay; zero if early or settled.
    pub current_reward: Amount,
    /// Whether the deposit can be withdrawn now without penalty.
    pub can_withdraw_now: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub total_locked: Amount,
    pub total_rewards_paid: Amount,
    pub pool_balance: Amount,
}

pub struct SavingsVault<G, C> {
    pub(crate) ledger: DepositLedger,
    pub(crate) gateway: G,
    pub(crate) clock: C,
    pub(crate) rewards: RewardEngine,
    pub(crate) penalties: PenaltyEngine,
    pub(crate) owner: AccountId,
    events: Vec<LedgerEvent>,
}

impl<G: AssetGateway, C: Clock> SavingsVault<G, C> {
    /// Open an empty vault.
    ///
    /// Fails if the config is invalid, or if the gateway's custody account is
    /// null or differs from the configured one.
    pub fn open(config: &VaultConfig, gateway: G, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let custody = gateway.custody();
        if custody.is_null() {
            return Err(ConfigError::NullAddress("asset gateway custody"));
        }
        if custody != config.custody {
            return Err(ConfigError::CustodyMismatch {
                configured: config.custody,
                gateway: custody,
            });
        }

        tracing::info!(
            owner = %config.owner,
            custody = %custody,
            min_lock_secs = config.rates.min_lock_period.as_secs(),
            "Savings vault opened"
        );

        Ok(Self {
            ledger: DepositLedger::new(),
            gateway,
            clock,
            rewards: RewardEngine::new(&config.rates),
            penalties: PenaltyEngine::new(&config.rates),
            owner: config.owner,
            events: Vec::new(),
        })
    }

    /// Lock `amount` for `user`. Returns the new deposit's index.
    pub fn deposit(&mut self, user: AccountId, amount: Amount) -> Result<usize, LedgerError> {
        let principal = Principal::new(amount);
        let now = self.clock.now();
        let index = self
            .ledger
            .deposit(&mut self.gateway, user, principal, now)
            .inspect_err(|e| tracing::debug!(%user, amount, error = %e, "Deposit rejected"))?;

        tracing::info!(
            %user,
            amount,
            index,
            total_locked = self.ledger.total_locked(),
            "Deposit recorded"
        );
        self.emit(LedgerEvent::Deposited {
            user,
            principal,
            deposit_index: index,
        });
        Ok(index)
    }

    pub fn deposit_info(&self, user: &AccountId, index: usize) -> Result<DepositInfo, LedgerError> {
        let record = self.ledger.get(user, index)?;
        let elapsed = self.clock.now().elapsed_since(record.deposited_at());
        let (current_reward, can_withdraw_now) = if record.is_settled() {
            (0, false)
        } else {
            (
                self.rewards.calculate_reward(record.principal(), elapsed)?,
                self.rewards.is_matured(elapsed),
            )
        };
        Ok(DepositInfo {
            principal: record.principal(),
            deposited_at: record.deposited_at(),
            settled: record.is_settled(),
            current_reward,
            can_withdraw_now,
        })
    }

    pub fn deposit_count(&self, user: &AccountId) -> usize {
        self.ledger.deposit_count(user)
    }

    pub fn deposits_of(&self, user: &AccountId) -> &[DepositRecord] {
        self.ledger.deposits_of(user)
    }

    pub fn total_deposited_by(&self, user: &AccountId) -> Amount {
        self.ledger.total_deposited_by(user)
    }

    pub fn aggregate_stats(&self) -> AggregateStats {
        AggregateStats {
            total_locked: self.ledger.total_locked(),
            total_rewards_paid: self.ledger.total_rewards_paid(),
            pool_balance: self.gateway.holdings(),
        }
    }

    pub fn ledger(&self) -> &DepositLedger {
        &self.ledger
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn custody(&self) -> AccountId {
        self.gateway.custody()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Direct access to the asset, for funding and fault injection.
    /// Ledger records stay reachable only through vault operations.
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Events emitted since the last [`take_events`](Self::take_events).
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        tracing::debug!(event = event.name(), "Event emitted");
        self.events.push(event);
    }
}
