//! Wall-clock source for claim ages
//!
//! Expiry compares the current time against the `created_at` of a WRITING
//! claim. The clock is injected so tests can move time without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in whole seconds since the Unix epoch
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time (seconds since epoch)
    fn now_secs(&self) -> u64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock fixed at `now_secs`
    pub fn new(now_secs: u64) -> Self {
        ManualClock {
            now: AtomicU64::new(now_secs),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the clock to an absolute time
    pub fn set(&self, now_secs: u64) {
        self.now.store(now_secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
