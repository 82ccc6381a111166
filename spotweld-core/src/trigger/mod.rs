//! Trigger handling
//!
//! Two mutually exclusive sources can start a weld: the contact sense
//! input (electrodes touching the work) or the foot switch. Edge
//! interrupts latch into [`TriggerEdges`]; the [`TriggerArbiter`] decides
//! what to do with them.

pub mod arbiter;
pub mod edges;

pub use arbiter::{
    TriggerAction, TriggerActions, TriggerArbiter, TriggerInputs, TriggerState,
    CONTINUOUS_WARN_MS, INTERWELD_DELAY_MS, MIN_FOOT_SWITCH_MS,
};
pub use edges::TriggerEdges;
