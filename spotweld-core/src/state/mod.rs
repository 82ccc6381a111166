//! Observable weld core state
//!
//! Transitions of the trigger arbiter and the weld cycle are recorded as
//! events for the firmware to report.

pub mod events;

pub use events::{EventLog, TimedEvent, WeldEvent, EVENT_CAPACITY};
