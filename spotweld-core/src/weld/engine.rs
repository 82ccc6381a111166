//! Weld cycle state machine
//!
//! Driven from three contexts: the weld-tick interrupt advances timed
//! cycles, the zero-crossing interrupt resolves requested output switches,
//! and the service routine starts cycles and drives continuous welding.
//! All of them mutate the one [`ActiveCycle`] inside a critical section.

use crate::mains::{CrossingPoll, ZeroCrossMonitor};
use crate::sync::{CriticalSection, Shared};
use crate::timing::{Tick, WeldTick, WeldTimeBase};
use crate::traits::WeldOutput;

use super::cycle::{
    ActiveCycle, CrossingAction, CycleBoundaries, CycleKind, PendingCrossing, WeldCycleSpec,
    WeldStage,
};

/// Rejected stage or cycle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageError {
    /// A timed cycle is in progress
    Busy,
    /// Welding is not enabled
    Disabled,
}

impl StageError {
    /// Result code reported to the UI collaborator
    pub fn code(self) -> i8 {
        match self {
            Self::Busy => -1,
            Self::Disabled => 0,
        }
    }
}

/// What a weld tick did to the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvanceOutcome {
    /// Nothing due
    Idle,
    /// Moved to the next stage or requested a crossing
    Stepped,
    /// Cycle completed
    Finished,
    /// The cycle was in a stage its kind never reaches; output forced off
    Unexpected { kind: CycleKind, stage: WeldStage },
}

/// What a crossing poll did to the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrossingOutcome {
    /// No crossing requested
    Idle,
    /// Still waiting inside the loss window
    Waiting,
    /// The crossing arrived and the action was applied
    Switched(CrossingAction),
    /// No crossing within the loss window; the cycle was halted
    TimedOut(CrossingAction),
}

/// The weld cycle engine and its time base
pub struct WeldCycleEngine {
    cycle: Shared<ActiveCycle>,
    timer: WeldTimeBase,
}

impl Default for WeldCycleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeldCycleEngine {
    pub const fn new() -> Self {
        Self {
            cycle: Shared::new(ActiveCycle::IDLE),
            timer: WeldTimeBase::new(),
        }
    }

    /// The weld time base driving this engine
    pub fn timer(&self) -> &WeldTimeBase {
        &self.timer
    }

    pub fn snapshot(&self, cs: CriticalSection<'_>) -> ActiveCycle {
        self.cycle.get(cs)
    }

    pub fn stage(&self, cs: CriticalSection<'_>) -> WeldStage {
        self.cycle.get(cs).stage
    }

    /// No timed cycle armed and no crossing outstanding
    pub fn is_idle(&self, cs: CriticalSection<'_>) -> bool {
        self.cycle.get(cs).is_idle()
    }

    /// Arm a timed cycle
    ///
    /// Accepted only from `Wait` with nothing armed; a rejected request
    /// changes nothing.
    pub fn start_cycle(
        &self,
        cs: CriticalSection<'_>,
        spec: &WeldCycleSpec,
        enabled: bool,
    ) -> Result<(), StageError> {
        let cycle = self.cycle.get(cs);
        if cycle.stage != WeldStage::Wait || !cycle.is_idle() {
            return Err(StageError::Busy);
        }
        if !enabled {
            return Err(StageError::Disabled);
        }

        self.cycle.set(
            cs,
            ActiveCycle {
                kind: spec.kind,
                stage: WeldStage::Wait,
                bounds: CycleBoundaries::compute(spec),
                target: 0,
                offset: 0,
                armed: true,
                pending: None,
            },
        );
        self.timer.reset(cs);
        self.timer.start(cs);
        Ok(())
    }

    /// Weld-tick interrupt entry point
    ///
    /// Counts the period and advances the cycle if welding is enabled.
    pub fn on_weld_tick<W: WeldOutput + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        zero_cross: &ZeroCrossMonitor,
        now: Tick,
        enabled: bool,
        output: &mut W,
    ) -> AdvanceOutcome {
        match self.timer.tick(cs) {
            Some(serviced) if enabled => self.advance(cs, serviced, zero_cross, now, output),
            _ => AdvanceOutcome::Idle,
        }
    }

    /// Advance the cycle for the serviced weld tick
    pub fn advance<W: WeldOutput + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        serviced: WeldTick,
        zero_cross: &ZeroCrossMonitor,
        now: Tick,
        output: &mut W,
    ) -> AdvanceOutcome {
        let mut cycle = self.cycle.get(cs);
        if !cycle.armed || cycle.pending.is_some() {
            return AdvanceOutcome::Idle;
        }

        match (cycle.kind, cycle.stage) {
            (_, WeldStage::Wait) => {
                self.request(cs, &mut cycle, CrossingAction::StartPulse0, zero_cross, now);
                AdvanceOutcome::Stepped
            }
            (kind, WeldStage::Pulse0) => {
                if serviced < cycle.target {
                    return AdvanceOutcome::Idle;
                }
                output.set_weld(false);
                match kind {
                    CycleKind::Double => {
                        cycle.stage = WeldStage::Delay;
                        cycle.target = cycle.bounds.delay_end.wrapping_add(cycle.offset);
                        self.cycle.set(cs, cycle);
                        AdvanceOutcome::Stepped
                    }
                    CycleKind::Single => {
                        self.finish(cs, cycle);
                        AdvanceOutcome::Finished
                    }
                }
            }
            (CycleKind::Double, WeldStage::Delay) => {
                if serviced < cycle.target {
                    return AdvanceOutcome::Idle;
                }
                self.request(cs, &mut cycle, CrossingAction::StartPulse1, zero_cross, now);
                AdvanceOutcome::Stepped
            }
            (CycleKind::Double, WeldStage::Pulse1) => {
                if serviced < cycle.target {
                    return AdvanceOutcome::Idle;
                }
                output.set_weld(false);
                self.finish(cs, cycle);
                AdvanceOutcome::Finished
            }
            (kind, stage) => {
                self.emergency_halt(cs, output);
                AdvanceOutcome::Unexpected { kind, stage }
            }
        }
    }

    /// Resolve an outstanding crossing request
    ///
    /// Called from the zero-crossing interrupt, the weld tick and the
    /// service routine; whichever runs first after the crossing (or after
    /// the loss window) settles it.
    pub fn poll_crossing<W: WeldOutput + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        zero_cross: &ZeroCrossMonitor,
        now: Tick,
        output: &mut W,
    ) -> CrossingOutcome {
        let mut cycle = self.cycle.get(cs);
        let Some(pending) = cycle.pending else {
            return CrossingOutcome::Idle;
        };

        match zero_cross.poll_crossing(cs, pending.requested_at, now) {
            CrossingPoll::Pending => CrossingOutcome::Waiting,
            CrossingPoll::TimedOut => {
                self.emergency_halt(cs, output);
                CrossingOutcome::TimedOut(pending.action)
            }
            CrossingPoll::Detected => {
                cycle.pending = None;
                let waited = self.timer.elapsed(cs).wrapping_sub(pending.requested_weld);

                match pending.action {
                    CrossingAction::StartPulse0 => {
                        cycle.offset = cycle.offset.wrapping_add(waited);
                        cycle.stage = WeldStage::Pulse0;
                        cycle.target = cycle.bounds.pulse0_end.wrapping_add(cycle.offset);
                        output.set_weld(true);
                    }
                    CrossingAction::StartPulse1 => {
                        cycle.offset = cycle.offset.wrapping_add(waited);
                        cycle.stage = WeldStage::Pulse1;
                        cycle.target = cycle.bounds.pulse1_end.wrapping_add(cycle.offset);
                        output.set_weld(true);
                    }
                    CrossingAction::StartRun => {
                        cycle.stage = WeldStage::Run;
                        output.set_weld(true);
                    }
                    CrossingAction::StopRun => {
                        cycle.stage = WeldStage::End;
                        output.set_weld(false);
                    }
                }

                self.cycle.set(cs, cycle);
                CrossingOutcome::Switched(pending.action)
            }
        }
    }

    /// Start continuous welding at the next crossing
    ///
    /// Returns false if nothing was requested (already running, already
    /// waiting, or a timed cycle is armed).
    pub fn begin_run(&self, cs: CriticalSection<'_>, zero_cross: &ZeroCrossMonitor, now: Tick) -> bool {
        let mut cycle = self.cycle.get(cs);
        if cycle.armed || cycle.stage == WeldStage::Run || cycle.pending.is_some() {
            return false;
        }
        self.request(cs, &mut cycle, CrossingAction::StartRun, zero_cross, now);
        true
    }

    /// Stop continuous welding at the next crossing
    ///
    /// Replaces a start that has not happened yet.
    pub fn end_run(&self, cs: CriticalSection<'_>, zero_cross: &ZeroCrossMonitor, now: Tick) -> bool {
        let mut cycle = self.cycle.get(cs);
        if cycle.armed {
            return false;
        }
        match cycle.pending {
            Some(p) if p.action == CrossingAction::StopRun => false,
            _ => {
                self.request(cs, &mut cycle, CrossingAction::StopRun, zero_cross, now);
                true
            }
        }
    }

    /// Set the stage from outside the engine
    ///
    /// Only settled stages (`Wait`, `Run`, `End`) may be set, and only
    /// while no timed cycle or crossing is outstanding.
    pub fn set_stage(
        &self,
        cs: CriticalSection<'_>,
        stage: WeldStage,
        enabled: bool,
    ) -> Result<(), StageError> {
        if !enabled {
            return Err(StageError::Disabled);
        }
        let mut cycle = self.cycle.get(cs);
        if !cycle.stage.is_settled() || !cycle.is_idle() || !stage.is_settled() {
            return Err(StageError::Busy);
        }
        cycle.stage = stage;
        self.cycle.set(cs, cycle);
        Ok(())
    }

    /// Return to `Wait` for the next weld, if nothing is in progress
    pub fn reset_stage(&self, cs: CriticalSection<'_>) -> bool {
        self.force_settled(cs, WeldStage::Wait)
    }

    /// Park in `End`, if nothing is in progress
    pub fn park(&self, cs: CriticalSection<'_>) -> bool {
        self.force_settled(cs, WeldStage::End)
    }

    /// Abort whatever is running and switch the output off
    pub fn emergency_halt<W: WeldOutput + ?Sized>(&self, cs: CriticalSection<'_>, output: &mut W) {
        self.cycle.update(cs, |mut c| {
            c.armed = false;
            c.pending = None;
            c.offset = 0;
            c.stage = WeldStage::End;
            c
        });
        self.timer.stop(cs);
        output.set_weld(false);
    }

    /// Switch the output off unless the stage and enable state allow it
    ///
    /// Returns true if the output had to be forced off.
    pub fn enforce_output_invariant<W: WeldOutput + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        enabled: bool,
        output: &mut W,
    ) -> bool {
        let allowed = enabled && self.stage(cs).output_allowed();
        if output.is_weld_on() && !allowed {
            output.set_weld(false);
            return true;
        }
        false
    }

    fn force_settled(&self, cs: CriticalSection<'_>, stage: WeldStage) -> bool {
        let mut cycle = self.cycle.get(cs);
        if !cycle.is_idle() || !cycle.stage.is_settled() {
            return false;
        }
        cycle.stage = stage;
        self.cycle.set(cs, cycle);
        true
    }

    fn request(
        &self,
        cs: CriticalSection<'_>,
        cycle: &mut ActiveCycle,
        action: CrossingAction,
        zero_cross: &ZeroCrossMonitor,
        now: Tick,
    ) {
        zero_cross.arm(cs);
        cycle.pending = Some(PendingCrossing {
            action,
            requested_at: now,
            requested_weld: self.timer.elapsed(cs),
        });
        self.cycle.set(cs, *cycle);
    }

    fn finish(&self, cs: CriticalSection<'_>, mut cycle: ActiveCycle) {
        cycle.armed = false;
        cycle.pending = None;
        cycle.offset = 0;
        cycle.stage = WeldStage::End;
        self.cycle.set(cs, cycle);
        self.timer.stop(cs);
    }
}
