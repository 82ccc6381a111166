//! Weld cycle time base

use crate::sync::{CriticalSection, Shared};

use super::WeldTick;

/// Start/stoppable weld tick counter (50 ms per tick)
///
/// Counts only while running. The weld-tick interrupt calls [`tick`],
/// which hands back the index of the period being serviced so the cycle
/// engine can compare it against its stage target.
///
/// [`tick`]: WeldTimeBase::tick
pub struct WeldTimeBase {
    running: Shared<bool>,
    elapsed: Shared<WeldTick>,
}

impl Default for WeldTimeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl WeldTimeBase {
    /// Create a stopped time base
    pub const fn new() -> Self {
        Self {
            running: Shared::new(false),
            elapsed: Shared::new(0),
        }
    }

    /// Start counting (idempotent)
    pub fn start(&self, cs: CriticalSection<'_>) {
        self.running.set(cs, true);
    }

    /// Stop counting (idempotent)
    pub fn stop(&self, cs: CriticalSection<'_>) {
        self.running.set(cs, false);
    }

    /// Reset the counter to zero without changing the run state
    pub fn reset(&self, cs: CriticalSection<'_>) {
        self.elapsed.set(cs, 0);
    }

    /// Whether the time base is running
    pub fn is_running(&self, cs: CriticalSection<'_>) -> bool {
        self.running.get(cs)
    }

    /// Weld ticks counted since the last reset
    pub fn elapsed(&self, cs: CriticalSection<'_>) -> WeldTick {
        self.elapsed.get(cs)
    }

    /// Count one weld period
    ///
    /// Returns the index of the period that just ended, or `None` while
    /// stopped.
    pub fn tick(&self, cs: CriticalSection<'_>) -> Option<WeldTick> {
        if !self.running.get(cs) {
            return None;
        }
        let serviced = self.elapsed.get(cs);
        self.elapsed.set(cs, serviced.wrapping_add(1));
        Some(serviced)
    }
}
