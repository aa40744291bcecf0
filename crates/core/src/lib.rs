//! Time-locked savings ledger.
//!
//! Users deposit a fungible asset. Each deposit accrues a stepped reward once
//! it has been locked for the minimum period, and can be withdrawn at any
//! time: early for principal minus a penalty, or after maturity for principal
//! plus reward. Payouts are checked against the pool balance before any funds
//! move, and a withdrawal that cannot be paid leaves no trace.
//!
//! ```text
//! caller ─► SavingsVault::withdraw ─► DepositLedger::get
//!                                  ─► PenaltyEngine | RewardEngine
//!                                  ─► DepositLedger::settle
//!                                  ─► solvency check ─► AssetGateway::push
//!                                  ─► LedgerEvent
//! ```

mod admin;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod penalty;
pub mod reward;
pub mod scenario;
pub mod types;
pub mod vault;
pub mod withdrawal;

pub use clock::{Clock, SharedMockClock, SystemClock};
pub use config::{ConfigError, RateSchedule, VaultConfig, BASIS_POINTS};
pub use error::LedgerError;
pub use events::LedgerEvent;
pub use gateway::{
    AssetGateway, BoolReturningGateway, ConformingToken, InMemoryAsset, Revert, RevertingGateway,
    RevertingToken, TransferError, TransferMode,
};
pub use ledger::{DepositLedger, DepositRecord, Settlement};
pub use penalty::PenaltyEngine;
pub use reward::RewardEngine;
pub use types::{AccountId, Amount, ElapsedTime, Principal, Timestamp};
pub use vault::{AggregateStats, DepositInfo, SavingsVault};
pub use withdrawal::{WithdrawalKind, WithdrawalQuote, WithdrawalReceipt};
