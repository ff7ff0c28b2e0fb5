//! Time sources for evaluation and reporting.
//!
//! The monitor never reads the wall clock directly; it asks a [`Clock`], so
//! replays and tests can drive activation windows deterministically.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::coord::TimestampMs;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now_ms(&self) -> TimestampMs;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: TimestampMs) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Jump to `now_ms`.
    pub fn set(&self, now_ms: TimestampMs) {
        self.now.store(now_ms, Ordering::Release);
    }

    /// Move forward by `delta_ms` and return the new time.
    pub fn advance(&self, delta_ms: i64) -> TimestampMs {
        self.now.fetch_add(delta_ms, Ordering::AcqRel) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::Acquire)
    }
}
