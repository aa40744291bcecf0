use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount, Principal};

/// Events published to off-chain observers.
///
/// Field order is part of the observer contract and is preserved by
/// serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Deposited {
        user: AccountId,
        principal: Principal,
        deposit_index: usize,
    },
    Withdrawn {
        user: AccountId,
        principal: Principal,
        reward: Amount,
        deposit_index: usize,
    },
    EarlyWithdrawn {
        user: AccountId,
        payout: Amount,
        penalty: Amount,
        deposit_index: usize,
    },
    OwnershipTransferred {
        previous_owner: AccountId,
        new_owner: AccountId,
    },
    EmergencySwept {
        owner: AccountId,
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Deposited { .. } => "Deposited",
            LedgerEvent::Withdrawn { .. } => "Withdrawn",
            LedgerEvent::EarlyWithdrawn { .. } => "EarlyWithdrawn",
            LedgerEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            LedgerEvent::EmergencySwept { .. } => "EmergencySwept",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_field_order(event: &LedgerEvent, fields: &[&str]) {
        let json = serde_json::to_string(event).unwrap();
        assert!(
            json.starts_with(&format!("{{\"{}\":", event.name())),
            "{json}"
        );
        let positions: Vec<usize> = fields
            .iter()
            .map(|field| json.find(&format!("\"{field}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn test_deposited_field_order() {
        let event = LedgerEvent::Deposited {
            user: AccountId::new([1; 32]),
            principal: Principal::new(1_000),
            deposit_index: 0,
        };
        assert_field_order(&event, &["user", "principal", "deposit_index"]);
    }

    #[test]
    fn test_withdrawn_field_order() {
        let event = LedgerEvent::Withdrawn {
            user: AccountId::new([1; 32]),
            principal: Principal::new(1_000),
            reward: 20,
            deposit_index: 3,
        };
        assert_field_order(&event, &["user", "principal", "reward", "deposit_index"]);
    }

    #[test]
    fn test_early_withdrawn_field_order() {
        let event = LedgerEvent::EarlyWithdrawn {
            user: AccountId::new([1; 32]),
            payout: 900,
            penalty: 100,
            deposit_index: 1,
        };
        assert_field_order(&event, &["user", "payout", "penalty", "deposit_index"]);
    }

    #[test]
    fn test_early_withdrawn_round_trips() {
        let event = LedgerEvent::EarlyWithdrawn {
            user: AccountId::new([2; 32]),
            payout: 900,
            penalty: 100,
            deposit_index: 0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(serde_json::from_str::<LedgerEvent>(&json).unwrap(), event);
        assert_eq!(event.name(), "EarlyWithdrawn");
    }
}
