//! Collaborator traits
//!
//! These traits define the interface between the weld core and the
//! hardware-specific and UI implementations.

pub mod io;
pub mod ui;

pub use io::{Buzzer, MeasureRelay, ThresholdOutput, TriggerSense, WeldOutput, WelderHardware};
pub use ui::UiHooks;
