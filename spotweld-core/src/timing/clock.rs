//! System tick counter

use crate::sync::{CriticalSection, Shared};

use super::Tick;

/// Monotonic system tick counter (10 ms per tick)
///
/// Incremented from the system-tick interrupt. The counter is wider than
/// a single machine word on small targets, so reads go through the
/// critical section as well.
pub struct ClockSource {
    ticks: Shared<Tick>,
}

impl Default for ClockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource {
    /// Create a counter starting at zero
    pub const fn new() -> Self {
        Self {
            ticks: Shared::new(0),
        }
    }

    /// Advance by one tick, returning the new count
    pub fn tick(&self, cs: CriticalSection<'_>) -> Tick {
        self.ticks.update(cs, |t| t.wrapping_add(1))
    }

    /// Current tick count inside an open critical section
    pub fn now_cs(&self, cs: CriticalSection<'_>) -> Tick {
        self.ticks.get(cs)
    }

    /// Current tick count from any context
    pub fn now(&self) -> Tick {
        self.ticks.load()
    }
}
