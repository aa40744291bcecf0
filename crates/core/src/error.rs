use crate::gateway::TransferError;
use crate::types::{AccountId, Amount};

/// Caller-visible failures of ledger operations.
///
/// Every variant aborts the whole operation with no state change. Nothing is
/// retried internally.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("deposit amount must be greater than zero")]
    InvalidAmount,
    #[error("no deposit #{index} for {user}")]
    InvalidDepositId { user: AccountId, index: usize },
    #[error("deposit #{index} for {user} has already been withdrawn")]
    AlreadySettled { user: AccountId, index: usize },
    #[error("pool holds {available} but payout requires {required}")]
    InsolventPool { required: Amount, available: Amount },
    #[error("asset transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
    #[error("caller {caller} is not the owner")]
    Unauthorized { caller: AccountId },
    #[error("null address is not a valid {0}")]
    InvalidAddress(&'static str),
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}
