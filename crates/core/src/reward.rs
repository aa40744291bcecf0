//! Time-dependent reward for matured deposits.
//!
//! ```text
//! elapsed < min_lock:  reward = 0
//! otherwise:           base   = p * base_bps / 10000
//!                      extra  = (elapsed - min_lock) / bonus_period
//!                      bonus  = p * bonus_bps * extra / 10000
//!                      reward = base + bonus
//! ```
//!
//! All divisions floor, so the reward is a step function of elapsed time: flat
//! inside each bonus window and jumping at every boundary. Small principals
//! round down to a zero reward.

use crate::config::{RateSchedule, BASIS_POINTS};
use crate::error::LedgerError;
use crate::types::{Amount, ElapsedTime, Principal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardEngine {
    min_lock_period: ElapsedTime,
    bonus_period: ElapsedTime,
    base_reward_bps: u128,
    bonus_reward_bps: u128,
}

impl RewardEngine {
    /// `rates` must already be validated (nonzero bonus period).
    pub fn new(rates: &RateSchedule) -> Self {
        Self {
            min_lock_period: rates.min_lock_period,
            bonus_period: rates.bonus_period,
            base_reward_bps: u128::from(rates.base_reward_bps),
            bonus_reward_bps: u128::from(rates.bonus_reward_bps),
        }
    }

    /// Whether a deposit held for `elapsed` has matured.
    pub fn is_matured(&self, elapsed: ElapsedTime) -> bool {
        elapsed >= self.min_lock_period
    }

    /// Number of complete bonus windows past maturity.
    pub fn bonus_periods(&self, elapsed: ElapsedTime) -> u64 {
        if !self.is_matured(elapsed) {
            return 0;
        }
        let past_maturity = elapsed.as_secs() - self.min_lock_period.as_secs();
        past_maturity
            .checked_div(self.bonus_period.as_secs())
            .unwrap_or(0)
    }

    #[must_use = "a computed reward that is not paid is a bug"]
    pub fn calculate_reward(
        &self,
        principal: Principal,
        elapsed: ElapsedTime,
    ) -> Result<Amount, LedgerError> {
        if !self.is_matured(elapsed) {
            return Ok(0);
        }
        let p = principal.get();

        let base = p
            .checked_mul(self.base_reward_bps)
            .ok_or(LedgerError::Overflow("base reward"))?
            / BASIS_POINTS;

        let extra_periods = u128::from(self.bonus_periods(elapsed));
        let bonus = p
            .checked_mul(self.bonus_reward_bps)
            .and_then(|v| v.checked_mul(extra_periods))
            .ok_or(LedgerError::Overflow("bonus reward"))?
            / BASIS_POINTS;

        base.checked_add(bonus)
            .ok_or(LedgerError::Overflow("reward"))
    }
}
