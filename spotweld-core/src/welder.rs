//! The weld controller aggregate
//!
//! [`Welder`] owns every piece of weld core state together with the board
//! hardware and the UI hooks. The firmware keeps one in a static and calls
//! its interrupt entry points from the timer and pin interrupts (or tasks
//! standing in for them) and [`Welder::service`] from its main loop.
//!
//! Each entry point opens one critical section and borrows the hardware
//! and UI once, so a single entry point always sees a consistent state.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::{TriggerSource, WeldLimits, WeldSettings};
use crate::mains::{Polarity, ZeroCrossMonitor, ZeroCrossStatus};
use crate::safety::{EnableError, Fault, SafetyGate, SafetyStatus};
use crate::state::{EventLog, TimedEvent, WeldEvent};
use crate::sync::{CriticalSection, Shared};
use crate::timing::beeper::BEEP_TRIGGER_MS;
use crate::timing::{BeepTimer, ClockSource, Tick};
use crate::traits::{UiHooks, WelderHardware};
use crate::trigger::{TriggerAction, TriggerArbiter, TriggerEdges, TriggerInputs, TriggerState};
use crate::weld::{
    ActiveCycle, AdvanceOutcome, CrossingOutcome, StageError, WeldCycleEngine, WeldCycleSpec,
    WeldStage,
};

/// Spot welder control core
pub struct Welder<H, U> {
    clock: ClockSource,
    beeper: BeepTimer,
    zero_cross: ZeroCrossMonitor,
    edges: TriggerEdges,
    engine: WeldCycleEngine,
    gate: SafetyGate,
    settings: Shared<WeldSettings>,
    limits: WeldLimits,
    arbiter: Mutex<RefCell<TriggerArbiter>>,
    events: Mutex<RefCell<EventLog>>,
    hw: Mutex<RefCell<H>>,
    ui: Mutex<RefCell<U>>,
}

impl<H: WelderHardware, U: UiHooks> Welder<H, U> {
    /// Create a disabled welder with the standard setting bounds
    pub fn new(hw: H, ui: U, settings: WeldSettings) -> Self {
        Self::with_limits(hw, ui, settings, WeldLimits::default())
    }

    /// Create a disabled welder with custom setting bounds
    pub fn with_limits(hw: H, ui: U, settings: WeldSettings, limits: WeldLimits) -> Self {
        Self {
            clock: ClockSource::new(),
            beeper: BeepTimer::new(),
            zero_cross: ZeroCrossMonitor::new(),
            edges: TriggerEdges::new(),
            engine: WeldCycleEngine::new(),
            gate: SafetyGate::new(),
            settings: Shared::new(settings),
            limits,
            arbiter: Mutex::new(RefCell::new(TriggerArbiter::new())),
            events: Mutex::new(RefCell::new(EventLog::new())),
            hw: Mutex::new(RefCell::new(hw)),
            ui: Mutex::new(RefCell::new(ui)),
        }
    }

    // Interrupt entry points

    /// System tick interrupt (every 10 ms)
    pub fn on_system_tick(&self) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let now = self.clock.tick(cs);
            self.beeper.on_tick(cs, now, &mut *hw);
            self.poll_crossing(cs, now, &mut *hw);
        });
    }

    /// Weld tick interrupt (every 50 ms)
    pub fn on_weld_tick(&self) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let mut ui = self.ui.borrow_ref_mut(cs);
            let now = self.clock.now_cs(cs);
            let enabled = self.gate.is_enabled(cs);

            let outcome = self.track_stage(cs, || {
                self.engine
                    .on_weld_tick(cs, &self.zero_cross, now, enabled, &mut *hw)
            });

            match outcome {
                AdvanceOutcome::Idle | AdvanceOutcome::Stepped => {}
                AdvanceOutcome::Finished => {
                    self.record(cs, WeldEvent::CycleFinished);
                    ui.request_redraw();
                }
                AdvanceOutcome::Unexpected { kind, stage } => {
                    self.record(cs, WeldEvent::UnexpectedStage { kind, stage });
                    self.disable_inner(cs, &mut *hw);
                    ui.request_redraw();
                }
            }
        });
    }

    /// Zero-crossing interrupt
    pub fn on_zero_cross(&self, polarity: Polarity) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let now = self.clock.now_cs(cs);
            self.zero_cross.on_edge(cs, polarity, now);
            self.poll_crossing(cs, now, &mut *hw);
        });
    }

    /// Contact sense edge interrupt
    pub fn on_contact_edge(&self) {
        self.on_trigger_edge(TriggerSource::Contact);
    }

    /// Foot switch edge interrupt
    pub fn on_foot_switch_edge(&self) {
        self.on_trigger_edge(TriggerSource::FootSwitch);
    }

    fn on_trigger_edge(&self, source: TriggerSource) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let asserted = match source {
                TriggerSource::Contact => hw.contact_sensed(),
                TriggerSource::FootSwitch => hw.foot_switch_pressed(),
            };
            if self.edges.on_edge(cs, source, asserted) {
                self.ui.borrow_ref_mut(cs).reset_activity();
            }
        });
    }

    // Service routine

    /// Run one pass of the cooperative service routine
    ///
    /// Never blocks; call it continuously from the main loop.
    pub fn service(&self) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let mut ui = self.ui.borrow_ref_mut(cs);
            let now = self.clock.now_cs(cs);

            if self.service_mains(cs, now, &mut *hw, &mut *ui) {
                let enabled = self.gate.is_enabled(cs);
                if self.engine.enforce_output_invariant(cs, enabled, &mut *hw) {
                    self.record(cs, WeldEvent::OutputForcedOff);
                }
                return;
            }

            self.poll_crossing(cs, now, &mut *hw);
            self.run_arbiter(cs, now, &mut *hw, &mut *ui);

            let enabled = self.gate.is_enabled(cs);
            if self.engine.enforce_output_invariant(cs, enabled, &mut *hw) {
                self.record(cs, WeldEvent::OutputForcedOff);
            }
        });
    }

    /// Mains supervision; returns true while the welder must stay inert
    fn service_mains(&self, cs: CriticalSection<'_>, now: Tick, hw: &mut H, ui: &mut U) -> bool {
        if self.gate.fault(cs).is_some() {
            if self.zero_cross.is_lost(cs) {
                return true;
            }

            self.gate.clear_fault(cs);
            ui.clear_fault();
            ui.reset_activity();
            self.record(cs, WeldEvent::AcRestored);
            // A settings failure is recorded as an event; the welder stays disabled
            let _ = self.enable_inner(cs, hw, ui);
            return false;
        }

        if self.gate.is_enabled(cs) && self.zero_cross.check_silence(cs, now) {
            self.record(cs, WeldEvent::AcLost);
        }

        if !self.zero_cross.is_lost(cs) {
            return false;
        }

        self.disable_inner(cs, hw);
        if self.gate.latch_fault(cs, Fault::AcLost) {
            self.record(cs, WeldEvent::FaultLatched(Fault::AcLost));
            ui.show_fault(Fault::AcLost);
            self.beeper.start(cs, now, BEEP_TRIGGER_MS, hw);
        }
        true
    }

    fn run_arbiter(&self, cs: CriticalSection<'_>, now: Tick, hw: &mut H, ui: &mut U) {
        let settings = self.settings.get(cs);

        let contact_edge = self.edges.take(cs, TriggerSource::Contact);
        let foot_edge = self.edges.take(cs, TriggerSource::FootSwitch);
        let edge = match settings.trigger {
            TriggerSource::Contact => contact_edge,
            TriggerSource::FootSwitch => foot_edge,
        };

        let cycle = self.engine.snapshot(cs);
        let inputs = TriggerInputs {
            now,
            enabled: self.gate.is_enabled(cs),
            stage: cycle.stage,
            engine_idle: cycle.is_idle(),
            edge,
            contact: hw.contact_sensed(),
            foot_switch: hw.foot_switch_pressed(),
            ui_active: ui.is_active(),
        };

        let (from, to, actions) = {
            let mut arbiter = self.arbiter.borrow_ref_mut(cs);
            let from = arbiter.state();
            let actions = arbiter.step(&settings, &inputs);
            (from, arbiter.state(), actions)
        };
        if from != to {
            self.record(cs, WeldEvent::TriggerChanged { from, to });
        }

        for action in actions {
            self.apply(cs, now, &settings, action, hw, ui);
        }
    }

    fn apply(
        &self,
        cs: CriticalSection<'_>,
        now: Tick,
        settings: &WeldSettings,
        action: TriggerAction,
        hw: &mut H,
        ui: &mut U,
    ) {
        match action {
            TriggerAction::ArmDetection(source) => self.edges.arm(cs, source),
            TriggerAction::MeasureRelay(on) => hw.set_measure_relay(on),
            TriggerAction::Beep(ms) => self.beeper.start(cs, now, ms, hw),
            TriggerAction::RequestRedraw => ui.request_redraw(),
            TriggerAction::ResetActivity => ui.reset_activity(),
            TriggerAction::Dropped => self.record(cs, WeldEvent::TriggerDropped),
            TriggerAction::StartCycle => {
                if let Some(spec) = WeldCycleSpec::from_settings(settings) {
                    let _ = self.start_cycle_inner(cs, &spec, ui);
                }
            }
            TriggerAction::BeginRun => {
                self.engine.begin_run(cs, &self.zero_cross, now);
            }
            TriggerAction::EndRun => {
                self.engine.end_run(cs, &self.zero_cross, now);
            }
            TriggerAction::HaltRun => {
                self.track_stage(cs, || self.engine.emergency_halt(cs, hw));
            }
            TriggerAction::ResetStage => {
                self.track_stage(cs, || self.engine.reset_stage(cs));
            }
            TriggerAction::Park => {
                self.track_stage(cs, || self.engine.park(cs));
            }
        }
    }

    fn poll_crossing(&self, cs: CriticalSection<'_>, now: Tick, hw: &mut H) {
        let outcome = self.track_stage(cs, || {
            self.engine.poll_crossing(cs, &self.zero_cross, now, hw)
        });

        if let CrossingOutcome::TimedOut(action) = outcome {
            self.record(cs, WeldEvent::CrossingTimeout(action));
            self.disable_inner(cs, hw);
        }
    }

    fn start_cycle_inner(
        &self,
        cs: CriticalSection<'_>,
        spec: &WeldCycleSpec,
        ui: &mut U,
    ) -> Result<(), StageError> {
        let enabled = self.gate.is_enabled(cs);
        match self.engine.start_cycle(cs, spec, enabled) {
            Ok(()) => {
                ui.clear_redraw_hint();
                self.record(cs, WeldEvent::CycleStarted(spec.kind));
                Ok(())
            }
            Err(e) => {
                self.record(cs, WeldEvent::CycleRejected(e));
                Err(e)
            }
        }
    }

    fn enable_inner(&self, cs: CriticalSection<'_>, hw: &mut H, ui: &mut U) -> Result<(), EnableError> {
        let was_enabled = self.gate.is_enabled(cs);
        let settings = self.settings.get(cs);
        let result = self.gate.enable(
            cs,
            &settings,
            &self.limits,
            &self.zero_cross,
            &self.engine,
            hw,
        );

        match result {
            Ok(()) if !was_enabled => {
                self.record(cs, WeldEvent::Enabled);
                ui.request_redraw();
            }
            Ok(()) => {}
            Err(EnableError::Config(e)) => self.record(cs, WeldEvent::EnableRejected(e)),
            Err(EnableError::AcLost) => {}
        }
        result
    }

    fn disable_inner(&self, cs: CriticalSection<'_>, hw: &mut H) {
        let was_enabled = self.track_stage(cs, || self.gate.disable(cs, &self.engine, hw));
        if was_enabled {
            self.record(cs, WeldEvent::Disabled);
        }
    }

    fn track_stage<R>(&self, cs: CriticalSection<'_>, f: impl FnOnce() -> R) -> R {
        let from = self.engine.stage(cs);
        let result = f();
        let to = self.engine.stage(cs);
        if from != to {
            self.record(cs, WeldEvent::StageChanged { from, to });
        }
        result
    }

    fn record(&self, cs: CriticalSection<'_>, event: WeldEvent) {
        let now = self.clock.now_cs(cs);
        self.events.borrow_ref_mut(cs).record(now, event);
    }

    // UI collaborator surface

    /// Validate the settings and enable welding
    pub fn enable_weld(&self) -> Result<(), EnableError> {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let mut ui = self.ui.borrow_ref_mut(cs);
            self.enable_inner(cs, &mut *hw, &mut *ui)
        })
    }

    /// Halt any cycle and disable welding
    pub fn disable_weld(&self) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            self.disable_inner(cs, &mut *hw);
        });
    }

    /// Abort any cycle, switch the output off and clear the enable flag
    ///
    /// Welding stays off until [`Self::enable_weld`] is called again.
    pub fn emergency_halt(&self) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let was_enabled =
                self.track_stage(cs, || self.gate.emergency_halt(cs, &self.engine, &mut *hw));
            if was_enabled {
                self.record(cs, WeldEvent::Disabled);
            }
        });
    }

    /// Start a timed weld cycle directly
    pub fn start_cycle(&self, spec: &WeldCycleSpec) -> Result<(), StageError> {
        critical_section::with(|cs| {
            let mut ui = self.ui.borrow_ref_mut(cs);
            self.start_cycle_inner(cs, spec, &mut *ui)
        })
    }

    pub fn active_stage(&self) -> WeldStage {
        critical_section::with(|cs| self.engine.stage(cs))
    }

    /// Snapshot of the weld cycle
    pub fn active_cycle(&self) -> ActiveCycle {
        critical_section::with(|cs| self.engine.snapshot(cs))
    }

    /// Set the cycle stage (`Wait`, `Run` or `End`)
    pub fn set_active_stage(&self, stage: WeldStage) -> Result<(), StageError> {
        critical_section::with(|cs| {
            let enabled = self.gate.is_enabled(cs);
            self.track_stage(cs, || self.engine.set_stage(cs, stage, enabled))
        })
    }

    pub fn is_weld_enabled(&self) -> bool {
        critical_section::with(|cs| self.gate.is_enabled(cs))
    }

    /// Trigger arbiter state; [`TriggerState::code`] gives the numeric form
    pub fn is_weld_triggered(&self) -> TriggerState {
        critical_section::with(|cs| self.arbiter.borrow_ref(cs).state())
    }

    pub fn settings(&self) -> WeldSettings {
        self.settings.load()
    }

    pub fn limits(&self) -> WeldLimits {
        self.limits
    }

    /// Replace the weld settings
    ///
    /// Refused while a cycle or continuous weld is in progress. If welding
    /// is enabled the new settings are re-validated; settings that fail
    /// disable welding.
    pub fn update_settings(&self, settings: WeldSettings) -> Result<(), StageError> {
        critical_section::with(|cs| {
            let cycle = self.engine.snapshot(cs);
            let settled = matches!(cycle.stage, WeldStage::Wait | WeldStage::End);
            if !cycle.is_idle() || !settled {
                return Err(StageError::Busy);
            }

            self.settings.set(cs, settings);

            if self.gate.is_enabled(cs) {
                let mut hw = self.hw.borrow_ref_mut(cs);
                match self.limits.check(&settings) {
                    Ok(()) => hw.set_threshold(settings.contact_threshold),
                    Err(e) => {
                        self.record(cs, WeldEvent::EnableRejected(e));
                        self.disable_inner(cs, &mut *hw);
                    }
                }
            }
            Ok(())
        })
    }

    pub fn fault(&self) -> Option<Fault> {
        critical_section::with(|cs| self.gate.fault(cs))
    }

    pub fn safety_status(&self) -> SafetyStatus {
        critical_section::with(|cs| self.gate.status(cs))
    }

    pub fn zero_cross_status(&self) -> ZeroCrossStatus {
        critical_section::with(|cs| self.zero_cross.status(cs))
    }

    /// Current system tick
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Oldest unread event
    pub fn pop_event(&self) -> Option<TimedEvent> {
        critical_section::with(|cs| self.events.borrow_ref_mut(cs).pop())
    }

    /// Events discarded because nobody drained the queue
    pub fn dropped_events(&self) -> u32 {
        critical_section::with(|cs| self.events.borrow_ref(cs).dropped())
    }

    /// Run `f` with exclusive access to the hardware
    pub fn with_hw<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.hw.borrow_ref_mut(cs)))
    }

    /// Run `f` with exclusive access to the UI hooks
    pub fn with_ui<R>(&self, f: impl FnOnce(&mut U) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.ui.borrow_ref_mut(cs)))
    }
}
