//! Time sources.
//!
//! The economy only ever sees `Millis` values. Hosts pick a clock; tests use
//! [`ManualClock`] to drive time explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::game::state::Millis;

/// Monotonic millisecond source.
pub trait Clock: Send + Sync {
    /// Milliseconds since the clock's epoch. Never decreases.
    fn now_ms(&self) -> Millis;
}

/// Wall-independent clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Clock whose epoch is now.
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }
}

/// Hand-driven clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock starting at `start`.
    pub fn new(start: Millis) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    /// Move forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to `ms`; ignored if it would move time backwards.
    pub fn set(&self, ms: Millis) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
