//! Vault configuration: rate schedule and account identities.
//!
//! Sources in increasing precedence: built-in defaults, a TOML file, then
//! `SAVINGS_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, ElapsedTime, SECONDS_PER_DAY};

/// Rate unit: 10000 = 100%.
pub const BASIS_POINTS: u128 = 10_000;

pub const DEFAULT_MIN_LOCK_PERIOD: ElapsedTime = ElapsedTime::from_days(60);
pub const DEFAULT_BONUS_PERIOD: ElapsedTime = ElapsedTime::from_days(30);
/// 2% on maturity.
pub const DEFAULT_BASE_REWARD_BPS: u32 = 200;
/// 1% per full bonus period after maturity.
pub const DEFAULT_BONUS_REWARD_BPS: u32 = 100;
/// 10% of principal.
pub const DEFAULT_EARLY_PENALTY_BPS: u32 = 1_000;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error("bonus period must be greater than zero")]
    ZeroBonusPeriod,
    #[error("early penalty of {0} bps exceeds 10000 bps")]
    PenaltyTooHigh(u32),
    #[error("{0} must not be the null address")]
    NullAddress(&'static str),
    #[error("gateway custody {gateway} does not match configured custody {configured}")]
    CustodyMismatch {
        configured: AccountId,
        gateway: AccountId,
    },
}

// =============================================================================
// RateSchedule
// =============================================================================

/// Reward and penalty parameters. Rates are in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSchedule {
    /// Minimum lock before a deposit matures.
    pub min_lock_period: ElapsedTime,
    /// Length of each bonus window after maturity.
    pub bonus_period: ElapsedTime,
    pub base_reward_bps: u32,
    pub bonus_reward_bps: u32,
    pub early_penalty_bps: u32,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            min_lock_period: DEFAULT_MIN_LOCK_PERIOD,
            bonus_period: DEFAULT_BONUS_PERIOD,
            base_reward_bps: DEFAULT_BASE_REWARD_BPS,
            bonus_reward_bps: DEFAULT_BONUS_REWARD_BPS,
            early_penalty_bps: DEFAULT_EARLY_PENALTY_BPS,
        }
    }
}

impl RateSchedule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bonus_period.as_secs() == 0 {
            return Err(ConfigError::ZeroBonusPeriod);
        }
        if u128::from(self.early_penalty_bps) > BASIS_POINTS {
            return Err(ConfigError::PenaltyTooHigh(self.early_penalty_bps));
        }
        Ok(())
    }

    /// Smallest principal whose base reward is nonzero: `ceil(BASIS_POINTS / base rate)`.
    ///
    /// `None` when the base rate is zero.
    pub fn min_rewarded_principal(&self) -> Option<u128> {
        if self.base_reward_bps == 0 {
            return None;
        }
        Some(BASIS_POINTS.div_ceil(u128::from(self.base_reward_bps)))
    }
}

// =============================================================================
// VaultConfig
// =============================================================================

/// Everything needed to open a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Initial owner for admin operations.
    pub owner: AccountId,
    /// Account that holds pooled funds at the asset.
    pub custody: AccountId,
    #[serde(default)]
    pub rates: RateSchedule,
}

impl VaultConfig {
    pub fn new(owner: AccountId, custody: AccountId) -> Self {
        Self {
            owner,
            custody,
            rates: RateSchedule::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Override rate fields from `SAVINGS_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var, value })
        }

        if let Some(v) = lookup("SAVINGS_MIN_LOCK_SECS") {
            self.rates.min_lock_period = ElapsedTime::from_secs(parse("SAVINGS_MIN_LOCK_SECS", v)?);
        }
        if let Some(v) = lookup("SAVINGS_BONUS_PERIOD_SECS") {
            self.rates.bonus_period =
                ElapsedTime::from_secs(parse("SAVINGS_BONUS_PERIOD_SECS", v)?);
        }
        if let Some(v) = lookup("SAVINGS_BASE_REWARD_BPS") {
            self.rates.base_reward_bps = parse("SAVINGS_BASE_REWARD_BPS", v)?;
        }
        if let Some(v) = lookup("SAVINGS_BONUS_REWARD_BPS") {
            self.rates.bonus_reward_bps = parse("SAVINGS_BONUS_REWARD_BPS", v)?;
        }
        if let Some(v) = lookup("SAVINGS_EARLY_PENALTY_BPS") {
            self.rates.early_penalty_bps = parse("SAVINGS_EARLY_PENALTY_BPS", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_null() {
            return Err(ConfigError::NullAddress("owner"));
        }
        if self.custody.is_null() {
            return Err(ConfigError::NullAddress("custody"));
        }
        self.rates.validate()
    }

    /// Lock period in whole days, for display.
    pub fn min_lock_days(&self) -> u64 {
        self.rates.min_lock_period.as_secs() / SECONDS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample() -> VaultConfig {
        VaultConfig::new(AccountId::new([1; 32]), AccountId::new([2; 32]))
    }

    #[test]
    fn test_default_rates_are_valid() {
        let rates = RateSchedule::default();
        rates.validate().unwrap();
        assert_eq!(rates.min_lock_period.as_secs(), 60 * SECONDS_PER_DAY);
        assert_eq!(rates.min_rewarded_principal(), Some(50));
    }

    #[test]
    fn test_zero_bonus_period_rejected() {
        let rates = RateSchedule {
            bonus_period: ElapsedTime::ZERO,
            ..RateSchedule::default()
        };
        assert!(matches!(rates.validate(), Err(ConfigError::ZeroBonusPeriod)));
    }

    #[test]
    fn test_penalty_above_100_percent_rejected() {
        let rates = RateSchedule {
            early_penalty_bps: 10_001,
            ..RateSchedule::default()
        };
        assert!(matches!(
            rates.validate(),
            Err(ConfigError::PenaltyTooHigh(10_001))
        ));
    }

    #[test]
    fn test_null_owner_rejected() {
        let mut config = sample();
        config.owner = AccountId::NULL;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NullAddress("owner"))
        ));
    }

    #[test]
    fn test_toml_partial_rates_fall_back_to_defaults() {
        let text = format!(
            "owner = \"{}\"\ncustody = \"{}\"\n\n[rates]\nearly_penalty_bps = 500\n",
            "01".repeat(32),
            "02".repeat(32)
        );
        let config = VaultConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.owner, AccountId::new([1; 32]));
        assert_eq!(config.rates.early_penalty_bps, 500);
        assert_eq!(config.rates.base_reward_bps, DEFAULT_BASE_REWARD_BPS);
        assert_eq!(config.rates.min_lock_period, DEFAULT_MIN_LOCK_PERIOD);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SAVINGS_MIN_LOCK_SECS", "3600"),
            ("SAVINGS_EARLY_PENALTY_BPS", " 250 "),
        ]
        .into_iter()
        .collect();
        let mut config = sample();
        config
            .apply_overrides(|var| vars.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.rates.min_lock_period, ElapsedTime::from_secs(3600));
        assert_eq!(config.rates.early_penalty_bps, 250);
        assert_eq!(config.rates.bonus_period, DEFAULT_BONUS_PERIOD);
    }

    #[test]
    fn test_env_override_garbage_is_an_error() {
        let mut config = sample();
        let err = config
            .apply_overrides(|var| (var == "SAVINGS_BASE_REWARD_BPS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Env {
                var: "SAVINGS_BASE_REWARD_BPS",
                ..
            }
        ));
    }
}
