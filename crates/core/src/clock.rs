use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{ElapsedTime, Timestamp};

/// Source of the current time for the ledger.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // pre-epoch clocks clamp to zero
        let secs = chrono::Utc::now().timestamp().max(0);
        Timestamp::from_secs(secs.unsigned_abs())
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct SharedMockClock {
    secs: Arc<AtomicU64>,
}

impl SharedMockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(at: Timestamp) -> Self {
        let clock = Self::new();
        clock.set(at);
        clock
    }

    pub fn set(&self, at: Timestamp) {
        self.secs.store(at.as_secs(), Ordering::SeqCst);
    }

    /// Move time forward by `by`, stopping at the largest representable instant.
    pub fn advance(&self, by: ElapsedTime) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |secs| {
                Some(Timestamp::from_secs(secs).saturating_add(by).as_secs())
            });
    }
}

impl Clock for SharedMockClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}
