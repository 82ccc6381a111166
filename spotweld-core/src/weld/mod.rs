//! Weld cycle sequencing
//!
//! Timed cycles (single and double pulse) are sequenced by the weld-tick
//! interrupt; continuous welding is driven by the trigger arbiter. Every
//! output switch is aligned to an AC zero crossing.

pub mod cycle;
pub mod engine;

pub use cycle::{
    ActiveCycle, CrossingAction, CycleBoundaries, CycleKind, PendingCrossing, WeldCycleSpec,
    WeldStage,
};
pub use engine::{AdvanceOutcome, CrossingOutcome, StageError, WeldCycleEngine};
