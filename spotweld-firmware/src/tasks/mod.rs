//! Embassy async tasks
//!
//! Tick and edge tasks stand in for the timer and pin interrupts of the
//! weld core; the control task runs its main loop.

pub mod control;
pub mod edges;
pub mod tick;

pub use control::control_task;
pub use edges::{contact_task, foot_switch_task, zero_cross_task};
pub use tick::{system_tick_task, weld_tick_task};
