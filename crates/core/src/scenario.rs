//! Scripted replay of vault operations against an in-memory asset.
//!
//! A scenario is a JSON document:
//!
//! ```json
//! {
//!   "token": "reverting",
//!   "steps": [
//!     { "mint":     { "account": "<hex>", "amount": 5000 } },
//!     { "deposit":  { "user": "<hex>", "amount": 1000 } },
//!     { "advance":  { "days": 60 } },
//!     { "withdraw": { "user": "<hex>", "index": 0 } }
//!   ]
//! }
//! ```
//!
//! Minting to an account also approves custody to pull from it.

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SharedMockClock};
use crate::config::{ConfigError, VaultConfig};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::gateway::{AssetGateway, BoolReturningGateway, InMemoryAsset, RevertingGateway};
use crate::types::{AccountId, Amount, ElapsedTime, Timestamp};
use crate::vault::{AggregateStats, SavingsVault};

/// Which raw token shape backs the simulated gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Conforming,
    #[default]
    Reverting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Mint { account: AccountId, amount: Amount },
    /// Mint straight into custody, e.g. to fund rewards.
    Fund { amount: Amount },
    Deposit { user: AccountId, amount: Amount },
    Withdraw { user: AccountId, index: usize },
    Advance {
        #[serde(default)]
        days: u64,
        #[serde(default)]
        secs: u64,
    },
    Sweep { caller: AccountId },
    TransferOwnership { caller: AccountId, new_owner: AccountId },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Fund { .. } => "fund",
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Advance { .. } => "advance",
            Step::Sweep { .. } => "sweep",
            Step::TransferOwnership { .. } => "transfer_ownership",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub token: TokenKind,
    #[serde(default)]
    pub start_at: Timestamp,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub outcomes: Vec<StepOutcome>,
    pub stats: AggregateStats,
    pub conserved: bool,
}

impl SimulationReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("step {step} ({op}) failed: {source}")]
    StepFailed {
        step: usize,
        op: &'static str,
        source: LedgerError,
    },
}

/// Gateways whose asset is an [`InMemoryAsset`] the simulator can mint into.
trait MemoryBacked: AssetGateway {
    fn asset_mut(&mut self) -> &mut InMemoryAsset;
}

impl MemoryBacked for BoolReturningGateway<InMemoryAsset> {
    fn asset_mut(&mut self) -> &mut InMemoryAsset {
        self.token_mut()
    }
}

impl MemoryBacked for RevertingGateway<InMemoryAsset> {
    fn asset_mut(&mut self) -> &mut InMemoryAsset {
        self.token_mut()
    }
}

/// Replay `scenario` on a fresh vault.
///
/// With `strict`, the first failing step aborts the run; otherwise failures
/// are recorded in the report and the run continues.
pub fn run(
    config: &VaultConfig,
    scenario: &Scenario,
    strict: bool,
) -> Result<SimulationReport, SimulationError> {
    let clock = SharedMockClock::starting_at(scenario.start_at);
    let asset = InMemoryAsset::new();
    match scenario.token {
        TokenKind::Conforming => {
            let gateway = BoolReturningGateway::new(asset, config.custody);
            let vault = SavingsVault::open(config, gateway, clock.clone())?;
            replay(vault, clock, &scenario.steps, strict)
        }
        TokenKind::Reverting => {
            let gateway = RevertingGateway::new(asset, config.custody);
            let vault = SavingsVault::open(config, gateway, clock.clone())?;
            replay(vault, clock, &scenario.steps, strict)
        }
    }
}

fn replay<G: MemoryBacked>(
    mut vault: SavingsVault<G, SharedMockClock>,
    clock: SharedMockClock,
    steps: &[Step],
    strict: bool,
) -> Result<SimulationReport, SimulationError> {
    let mut outcomes = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        let span = tracing::info_span!("step", index = i, op = step.name());
        let _enter = span.enter();

        let result = apply(&mut vault, &clock, step);
        let events = vault.take_events();
        let error = match result {
            Ok(()) => None,
            Err(source) if strict => {
                return Err(SimulationError::StepFailed {
                    step: i,
                    op: step.name(),
                    source,
                });
            }
            Err(e) => {
                tracing::info!(error = %e, "Step failed, continuing");
                Some(e.to_string())
            }
        };
        outcomes.push(StepOutcome {
            step: i,
            op: step.name(),
            at: clock.now(),
            error,
            events,
        });
    }

    Ok(SimulationReport {
        outcomes,
        stats: vault.aggregate_stats(),
        conserved: vault.ledger().is_conserved(),
    })
}

fn apply<G: MemoryBacked>(
    vault: &mut SavingsVault<G, SharedMockClock>,
    clock: &SharedMockClock,
    step: &Step,
) -> Result<(), LedgerError> {
    match step {
        Step::Mint { account, amount } => {
            let custody = vault.custody();
            let asset = vault.gateway_mut().asset_mut();
            asset.mint(account, *amount)?;
            asset.approve(account, &custody, Amount::MAX);
        }
        Step::Fund { amount } => {
            let custody = vault.custody();
            vault.gateway_mut().asset_mut().mint(&custody, *amount)?;
        }
        Step::Deposit { user, amount } => {
            vault.deposit(*user, *amount)?;
        }
        Step::Withdraw { user, index } => {
            vault.withdraw(*user, *index)?;
        }
        Step::Advance { days, secs } => {
            clock.advance(ElapsedTime::from_days(*days));
            clock.advance(ElapsedTime::from_secs(*secs));
        }
        Step::Sweep { caller } => {
            vault.emergency_sweep(*caller)?;
        }
        Step::TransferOwnership { caller, new_owner } => {
            vault.transfer_ownership(*caller, *new_owner)?;
        }
    }
    Ok(())
}
