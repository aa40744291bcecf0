//! Owner-gated operations.
//!
//! The emergency sweep is the only way funds leave custody other than a user
//! withdrawal, and the only way to reach accumulated penalty proceeds. It
//! moves the entire pool, principal included, so every outstanding deposit
//! becomes unpayable (`InsolventPool`) until custody is refunded. Use it for
//! catastrophic recovery only, never for routine fee collection.

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::gateway::AssetGateway;
use crate::types::{AccountId, Amount};
use crate::vault::SavingsVault;

impl<G: AssetGateway, C: Clock> SavingsVault<G, C> {
    fn ensure_owner(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if *caller != self.owner {
            tracing::debug!(%caller, "Admin call rejected: not owner");
            return Err(LedgerError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: AccountId,
        new_owner: AccountId,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(&caller)?;
        if new_owner.is_null() {
            return Err(LedgerError::InvalidAddress("owner"));
        }
        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        tracing::info!(%previous_owner, %new_owner, "Ownership transferred");
        self.emit(LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    /// Move the whole pool to the owner. Returns the amount swept.
    pub fn emergency_sweep(&mut self, caller: AccountId) -> Result<Amount, LedgerError> {
        self.ensure_owner(&caller)?;
        let amount = self.gateway.holdings();
        if amount > 0 {
            self.gateway.push(&self.owner, amount)?;
        }
        tracing::warn!(
            owner = %self.owner,
            amount,
            total_locked = self.ledger.total_locked(),
            "Emergency sweep executed"
        );
        self.emit(LedgerEvent::EmergencySwept {
            owner: self.owner,
            amount,
        });
        Ok(amount)
    }
}
