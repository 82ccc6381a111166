//! Weld core events
//!
//! The core does not log. Notable transitions are recorded here and drained
//! by the firmware, which decides how to report them.

use heapless::Deque;

use crate::config::ConfigError;
use crate::safety::Fault;
use crate::timing::Tick;
use crate::trigger::TriggerState;
use crate::weld::{CrossingAction, CycleKind, StageError, WeldStage};

/// Number of events kept before the oldest is dropped
pub const EVENT_CAPACITY: usize = 16;

/// Something the weld core did or detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WeldEvent {
    /// Weld cycle stage changed
    StageChanged { from: WeldStage, to: WeldStage },
    /// Trigger arbiter changed state
    TriggerChanged { from: TriggerState, to: TriggerState },
    /// Trigger released before the hold time ran out
    TriggerDropped,
    /// A timed cycle was started
    CycleStarted(CycleKind),
    /// A timed cycle could not be started
    CycleRejected(StageError),
    /// A timed cycle completed
    CycleFinished,
    /// Welding enabled
    Enabled,
    /// Welding disabled
    Disabled,
    /// Enable refused because a setting is out of bounds
    EnableRejected(ConfigError),
    /// No zero crossing where one was expected
    AcLost,
    /// Zero crossings are being detected again
    AcRestored,
    /// A crossing-aligned switch timed out
    CrossingTimeout(CrossingAction),
    /// Fault latched
    FaultLatched(Fault),
    /// The cycle reached a stage its kind never uses
    UnexpectedStage { kind: CycleKind, stage: WeldStage },
    /// The weld output was on outside a weld stage and was forced off
    OutputForcedOff,
}

impl WeldEvent {
    /// Check if this event indicates a fault or a safety action
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            WeldEvent::AcLost
                | WeldEvent::CrossingTimeout(_)
                | WeldEvent::FaultLatched(_)
                | WeldEvent::UnexpectedStage { .. }
                | WeldEvent::OutputForcedOff
        )
    }
}

/// Event with the system tick it happened at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedEvent {
    pub at: Tick,
    pub event: WeldEvent,
}

/// Bounded event queue
#[derive(Debug, Default)]
pub struct EventLog {
    queue: Deque<TimedEvent, EVENT_CAPACITY>,
    dropped: u32,
}

impl EventLog {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    /// Record an event, dropping the oldest if full
    pub fn record(&mut self, at: Tick, event: WeldEvent) {
        if self.queue.is_full() {
            self.queue.pop_front();
            self.dropped = self.dropped.wrapping_add(1);
        }
        let _ = self.queue.push_back(TimedEvent { at, event });
    }

    /// Oldest unread event
    pub fn pop(&mut self) -> Option<TimedEvent> {
        self.queue.pop_front()
    }

    /// Events discarded because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_events() {
        assert!(WeldEvent::AcLost.is_fault());
        assert!(WeldEvent::FaultLatched(Fault::AcLost).is_fault());
        assert!(!WeldEvent::CycleFinished.is_fault());
        assert!(!WeldEvent::TriggerDropped.is_fault());
    }

    #[test]
    fn test_log_keeps_order() {
        let mut log = EventLog::new();
        log.record(1, WeldEvent::Enabled);
        log.record(2, WeldEvent::CycleFinished);
        assert_eq!(log.len(), 2);
        assert_eq!(log.pop().map(|e| e.event), Some(WeldEvent::Enabled));
        assert_eq!(log.pop().map(|e| e.at), Some(2));
        assert!(log.is_empty());
    }

    #[test]
    fn test_full_log_drops_oldest() {
        let mut log = EventLog::new();
        for at in 0..(EVENT_CAPACITY as Tick + 3) {
            log.record(at, WeldEvent::TriggerDropped);
        }
        assert_eq!(log.len(), EVENT_CAPACITY);
        assert_eq!(log.dropped(), 3);
        assert_eq!(log.pop().map(|e| e.at), Some(3));
    }
}
