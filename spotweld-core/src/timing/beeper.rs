//! Audible alert timing
//!
//! The buzzer is switched on by [`BeepTimer::start`] and switched off again
//! from the system-tick interrupt once the requested duration has passed.

use crate::sync::{CriticalSection, Shared};
use crate::traits::Buzzer;

use super::{elapsed, ms_to_ticks, Tick};

/// Alert durations used by the trigger arbiter (ms)
pub const BEEP_TRIGGER_MS: u32 = 100;
pub const BEEP_FIRE_MS: u32 = 50;
pub const BEEP_CHIRP_MS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveBeep {
    start: Tick,
    ticks: Tick,
}

/// System-tick driven buzzer timer
pub struct BeepTimer {
    active: Shared<Option<ActiveBeep>>,
}

impl Default for BeepTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl BeepTimer {
    /// Create an idle beep timer
    pub const fn new() -> Self {
        Self {
            active: Shared::new(None),
        }
    }

    /// Sound the buzzer for `ms` milliseconds (at least one tick)
    ///
    /// A new beep replaces one that is still sounding.
    pub fn start<B: Buzzer + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        now: Tick,
        ms: u32,
        buzzer: &mut B,
    ) {
        let ticks = ms_to_ticks(ms).max(1);
        self.active.set(cs, Some(ActiveBeep { start: now, ticks }));
        buzzer.set_buzzer(true);
    }

    /// Called on every system tick; silences an expired beep
    pub fn on_tick<B: Buzzer + ?Sized>(&self, cs: CriticalSection<'_>, now: Tick, buzzer: &mut B) {
        if let Some(beep) = self.active.get(cs) {
            if elapsed(now, beep.start) > beep.ticks {
                self.active.set(cs, None);
                buzzer.set_buzzer(false);
            }
        }
    }

    /// Whether a beep is currently sounding
    pub fn is_active(&self, cs: CriticalSection<'_>) -> bool {
        self.active.get(cs).is_some()
    }
}
