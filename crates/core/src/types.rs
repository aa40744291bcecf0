//! Value types shared by every component of the ledger.
//!
//! Amounts and times are wrapped in distinct newtypes so the reward call site
//! cannot confuse a principal with an elapsed time: `calculate_reward` takes a
//! [`Principal`] and an [`ElapsedTime`], and passing them the other way round
//! does not compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Plain asset amount: rewards, penalties, payouts and balances.
pub type Amount = u128;

pub const SECONDS_PER_DAY: u64 = 86_400;

// =============================================================================
// AccountId
// =============================================================================

/// 32-byte account identity. The all-zero value is the null address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub const NULL: AccountId = AccountId([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first 4 bytes are enough to tell accounts apart in logs
        write!(f, "AccountId({}..)", hex::encode(&self.0[..4]))
    }
}

/// Failure to parse an [`AccountId`] from its hex form.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseAccountIdError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("account id must be exactly 32 bytes (64 hex chars), got {0} bytes")]
    Length(usize),
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        let len = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseAccountIdError::Length(len))?;
        Ok(Self(arr))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Principal / time
// =============================================================================

/// The amount a user deposited, excluding any reward or penalty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(u128);

impl Principal {
    pub const fn new(amount: Amount) -> Self {
        Self(amount)
    }

    pub const fn get(self) -> Amount {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if the clock went backwards.
    pub fn elapsed_since(self, earlier: Timestamp) -> ElapsedTime {
        ElapsedTime(self.0.saturating_sub(earlier.0))
    }

    pub fn saturating_add(self, elapsed: ElapsedTime) -> Timestamp {
        Timestamp(self.0.saturating_add(elapsed.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A span of time in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElapsedTime(u64);

impl ElapsedTime {
    pub const ZERO: ElapsedTime = ElapsedTime(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Saturates at `u64::MAX` seconds.
    pub const fn from_days(days: u64) -> Self {
        Self(days.saturating_mul(SECONDS_PER_DAY))
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_hex_round_trip() {
        let id = AccountId::new([0xab; 32]);
        let text = id.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn test_account_id_rejects_wrong_length() {
        let err = "abcd".parse::<AccountId>().unwrap_err();
        assert_eq!(err, ParseAccountIdError::Length(2));
    }

    #[test]
    fn test_account_id_rejects_bad_hex() {
        let err = "zz".repeat(32).parse::<AccountId>().unwrap_err();
        assert!(matches!(err, ParseAccountIdError::Hex(_)));
    }

    #[test]
    fn test_null_account() {
        assert!(AccountId::NULL.is_null());
        assert!(AccountId::default().is_null());
        assert!(!AccountId::new([1; 32]).is_null());
    }

    #[test]
    fn test_account_id_serializes_as_hex_string() {
        let id = AccountId::new([1; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_huge_spans_saturate() {
        assert_eq!(ElapsedTime::from_days(u64::MAX).as_secs(), u64::MAX);
        let late = Timestamp::from_secs(u64::MAX - 10);
        assert_eq!(
            late.saturating_add(ElapsedTime::from_days(1)),
            Timestamp::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_elapsed_saturates_when_clock_goes_backwards() {
        let later = Timestamp::from_secs(100);
        let earlier = Timestamp::from_secs(40);
        assert_eq!(later.elapsed_since(earlier), ElapsedTime::from_secs(60));
        assert_eq!(earlier.elapsed_since(later), ElapsedTime::ZERO);
    }
}
