/*
[INPUT]:  System time, or a manually driven timestamp in tests
[OUTPUT]: Current Unix time in seconds
[POS]:    Infrastructure - injected time source for expiry and freshness checks
[UPDATE]: When time precision requirements change
*/

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of the current Unix timestamp
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// Wall clock used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Settable clock for deterministic tests
#[derive(Debug, Default)]
pub struct FixedClock {
    timestamp: AtomicU64,
}

impl FixedClock {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp: AtomicU64::new(timestamp),
        }
    }

    pub fn set(&self, timestamp: u64) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.timestamp.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.timestamp.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now_secs(), 150);
        clock.set(7);
        assert_eq!(clock.now_secs(), 7);
    }

    #[test]
    fn test_system_clock_is_after_2023() {
        assert!(SystemClock.now_secs() > 1_672_531_200);
    }
}
