use crate::config::{RateSchedule, BASIS_POINTS};
use crate::error::LedgerError;
use crate::types::{Amount, Principal};

/// Flat early-withdrawal penalty: `p * early_penalty_bps / 10000`, floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyEngine {
    early_penalty_bps: u128,
}

impl PenaltyEngine {
    pub fn new(rates: &RateSchedule) -> Self {
        Self {
            early_penalty_bps: u128::from(rates.early_penalty_bps),
        }
    }

    /// Never exceeds `principal` for a validated schedule.
    pub fn calculate_penalty(&self, principal: Principal) -> Result<Amount, LedgerError> {
        let scaled = principal
            .get()
            .checked_mul(self.early_penalty_bps)
            .ok_or(LedgerError::Overflow("penalty"))?;
        Ok(scaled / BASIS_POINTS)
    }
}
