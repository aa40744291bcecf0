//! Asset gateway: the only path by which funds enter or leave the ledger.
//!
//! Tokens come in two shapes. Conforming tokens report success with a `bool`;
//! non-conforming tokens return nothing and signal failure by reverting. The
//! adapters in this module fold both into `Result<(), TransferError>` so the
//! ledger never inspects token quirks itself.

mod memory;

pub use memory::{InMemoryAsset, TransferMode};

use crate::types::{AccountId, Amount};

// =============================================================================
// Errors
// =============================================================================

/// Normalized transfer failure.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransferError {
    /// A conforming token returned `false`.
    #[error("token rejected transfer of {amount}")]
    Rejected { amount: Amount },
    /// A non-conforming token reverted.
    #[error("token reverted: {0}")]
    Reverted(String),
    /// The call reported success but balances did not move by `expected`.
    #[error("transfer reported success but moved {moved} of {expected}")]
    NotDelivered { expected: Amount, moved: Amount },
}

/// Revert raised by a token that has no return value.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Revert(pub String);

// =============================================================================
// Trait: AssetGateway
// =============================================================================

/// Normalized fungible-asset interface consumed by the ledger.
pub trait AssetGateway {
    /// Account holding the pooled funds; `transfer` moves funds out of it.
    fn custody(&self) -> AccountId;

    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Move `amount` from custody to `to`.
    fn transfer(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` from `from` to `to` using custody's allowance.
    fn transfer_from(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// Current pooled balance.
    fn holdings(&self) -> Amount {
        self.balance_of(&self.custody())
    }

    /// Pull `amount` from `from` into custody, checking that it arrived.
    fn pull(&mut self, from: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let custody = self.custody();
        let before = self.balance_of(&custody);
        self.transfer_from(from, &custody, amount)?;
        let moved = self.balance_of(&custody).saturating_sub(before);
        if moved < amount {
            return Err(TransferError::NotDelivered {
                expected: amount,
                moved,
            });
        }
        Ok(())
    }

    /// Push `amount` out of custody to `to`, checking that it left.
    fn push(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let before = self.holdings();
        self.transfer(to, amount)?;
        let moved = before.saturating_sub(self.holdings());
        if moved < amount {
            return Err(TransferError::NotDelivered {
                expected: amount,
                moved,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Raw token shapes
// =============================================================================

/// Token whose transfers report success with a boolean.
pub trait ConformingToken {
    fn balance_of(&self, account: &AccountId) -> Amount;
    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount) -> bool;
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> bool;
}

/// Token whose transfers return nothing and revert on failure.
pub trait RevertingToken {
    fn balance_of(&self, account: &AccountId) -> Amount;
    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount)
        -> Result<(), Revert>;
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), Revert>;
}

// =============================================================================
// Adapters
// =============================================================================

/// Gateway over a [`ConformingToken`].
#[derive(Debug)]
pub struct BoolReturningGateway<T> {
    token: T,
    custody: AccountId,
}

impl<T: ConformingToken> BoolReturningGateway<T> {
    pub fn new(token: T, custody: AccountId) -> Self {
        Self { token, custody }
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }
}

impl<T: ConformingToken> AssetGateway for BoolReturningGateway<T> {
    fn custody(&self) -> AccountId {
        self.custody
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.token.balance_of(account)
    }

    fn transfer(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.token.transfer(&self.custody, to, amount) {
            Ok(())
        } else {
            Err(TransferError::Rejected { amount })
        }
    }

    fn transfer_from(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if self.token.transfer_from(&self.custody, from, to, amount) {
            Ok(())
        } else {
            Err(TransferError::Rejected { amount })
        }
    }
}

/// Gateway over a [`RevertingToken`].
#[derive(Debug)]
pub struct RevertingGateway<T> {
    token: T,
    custody: AccountId,
}

impl<T: RevertingToken> RevertingGateway<T> {
    pub fn new(token: T, custody: AccountId) -> Self {
        Self { token, custody }
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }
}

impl<T: RevertingToken> AssetGateway for RevertingGateway<T> {
    fn custody(&self) -> AccountId {
        self.custody
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.token.balance_of(account)
    }

    fn transfer(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        self.token
            .transfer(&self.custody, to, amount)
            .map_err(|Revert(reason)| TransferError::Reverted(reason))
    }

    fn transfer_from(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.token
            .transfer_from(&self.custody, from, to, amount)
            .map_err(|Revert(reason)| TransferError::Reverted(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(seed: u8) -> AccountId {
        AccountId::new([seed; 32])
    }

    fn funded_asset(holder: AccountId, spender: AccountId, amount: Amount) -> InMemoryAsset {
        let mut asset = InMemoryAsset::new();
        asset.mint(&holder, amount).unwrap();
        asset.approve(&holder, &spender, amount);
        asset
    }

    #[test]
    fn test_bool_gateway_pull_and_push() {
        let (user, custody) = (account(1), account(9));
        let mut gw = BoolReturningGateway::new(funded_asset(user, custody, 500), custody);

        gw.pull(&user, 300).unwrap();
        assert_eq!(gw.holdings(), 300);
        assert_eq!(gw.balance_of(&user), 200);

        gw.push(&user, 100).unwrap();
        assert_eq!(gw.holdings(), 200);
        assert_eq!(gw.balance_of(&user), 300);
    }

    #[test]
    fn test_bool_gateway_maps_false_to_rejected() {
        let (user, custody) = (account(1), account(9));
        let mut gw = BoolReturningGateway::new(funded_asset(user, custody, 50), custody);

        let err = gw.pull(&user, 51).unwrap_err();
        assert_eq!(err, TransferError::Rejected { amount: 51 });
        assert_eq!(gw.holdings(), 0);
    }

    #[test]
    fn test_reverting_gateway_maps_revert() {
        let (user, custody) = (account(1), account(9));
        let mut gw = RevertingGateway::new(funded_asset(user, custody, 50), custody);

        let err = gw.push(&user, 10).unwrap_err();
        assert!(matches!(err, TransferError::Reverted(_)));
    }

    #[test]
    fn test_silent_noop_is_not_delivered() {
        let (user, custody) = (account(1), account(9));
        let mut asset = funded_asset(user, custody, 500);
        asset.set_mode(TransferMode::SilentNoop);
        let mut gw = RevertingGateway::new(asset, custody);

        let err = gw.pull(&user, 100).unwrap_err();
        assert_eq!(
            err,
            TransferError::NotDelivered {
                expected: 100,
                moved: 0
            }
        );
        assert_eq!(gw.balance_of(&user), 500);
    }
}
