//! Trigger edge latches
//!
//! The contact and foot-switch interrupts only latch an edge when
//! detection has been armed for that input, and disarm it on the first
//! asserted edge. The service routine consumes the latch.

use crate::config::TriggerSource;
use crate::sync::{CriticalSection, Shared};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct EdgeLatch {
    armed: bool,
    latched: bool,
}

/// Edge latches for both trigger inputs
pub struct TriggerEdges {
    contact: Shared<EdgeLatch>,
    foot_switch: Shared<EdgeLatch>,
}

impl Default for TriggerEdges {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerEdges {
    pub const fn new() -> Self {
        Self {
            contact: Shared::new(EdgeLatch {
                armed: false,
                latched: false,
            }),
            foot_switch: Shared::new(EdgeLatch {
                armed: false,
                latched: false,
            }),
        }
    }

    fn latch(&self, source: TriggerSource) -> &Shared<EdgeLatch> {
        match source {
            TriggerSource::Contact => &self.contact,
            TriggerSource::FootSwitch => &self.foot_switch,
        }
    }

    /// Enable edge detection for one input
    pub fn arm(&self, cs: CriticalSection<'_>, source: TriggerSource) {
        self.latch(source).update(cs, |mut l| {
            l.armed = true;
            l
        });
    }

    /// Whether detection is currently enabled for an input
    pub fn is_armed(&self, cs: CriticalSection<'_>, source: TriggerSource) -> bool {
        self.latch(source).get(cs).armed
    }

    /// Edge interrupt for an input
    ///
    /// `asserted` is the input level read in the interrupt. Returns true if
    /// the edge was latched.
    pub fn on_edge(&self, cs: CriticalSection<'_>, source: TriggerSource, asserted: bool) -> bool {
        let latch = self.latch(source);
        let state = latch.get(cs);
        if !state.armed || !asserted {
            return false;
        }
        latch.set(
            cs,
            EdgeLatch {
                armed: false,
                latched: true,
            },
        );
        true
    }

    /// Consume the latched edge for an input
    pub fn take(&self, cs: CriticalSection<'_>, source: TriggerSource) -> bool {
        let latch = self.latch(source);
        let mut state = latch.get(cs);
        let latched = state.latched;
        state.latched = false;
        latch.set(cs, state);
        latched
    }
}
