//! Safety interlocks
//!
//! Gates welding on valid settings and a live mains signal, and holds the
//! latched fault that keeps the welder inert until the mains returns.

pub mod gate;

pub use gate::{EnableError, EnableState, Fault, SafetyGate, SafetyStatus};
