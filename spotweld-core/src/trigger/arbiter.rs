//! Trigger arbitration state machine
//!
//! Decides when a weld fires. The arbiter is a pure state machine: each
//! service pass hands it a snapshot of the inputs and it returns the side
//! effects to perform, in order. It never touches hardware itself.

use heapless::Vec;

use crate::config::{TriggerSource, WeldSettings, WeldType};
use crate::timing::beeper::{BEEP_CHIRP_MS, BEEP_FIRE_MS, BEEP_TRIGGER_MS};
use crate::timing::{expired, ms_to_ticks, Tick};
use crate::weld::WeldStage;

/// Delay between the end of one weld and re-arming for the next (ms)
pub const INTERWELD_DELAY_MS: u32 = 1_000;

/// Foot switch hold before a continuous weld starts (ms)
pub const MIN_FOOT_SWITCH_MS: u32 = 50;

/// Warning chirp interval during a continuous weld (ms)
pub const CONTINUOUS_WARN_MS: u32 = 500;

/// Trigger arbitration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerState {
    /// Waiting for a trigger edge
    #[default]
    Idle,
    /// Trigger seen, waiting out the hold time
    Armed,
    /// Weld in progress
    Firing,
    /// Inter-weld delay
    Cooldown,
}

impl TriggerState {
    /// Numeric trigger state reported to the UI collaborator
    pub fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Armed => 1,
            Self::Firing => 2,
            Self::Cooldown => 3,
        }
    }
}

/// Inputs sampled by the service routine for one arbiter step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerInputs {
    /// Current system tick
    pub now: Tick,
    /// Welding is enabled
    pub enabled: bool,
    /// Current weld cycle stage
    pub stage: WeldStage,
    /// No timed cycle armed and no crossing outstanding
    pub engine_idle: bool,
    /// A trigger edge was latched for the configured source
    pub edge: bool,
    /// Electrodes touching the work piece
    pub contact: bool,
    /// Foot switch pressed
    pub foot_switch: bool,
    /// The operator has interacted with the UI recently
    pub ui_active: bool,
}

/// Side effect requested by the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerAction {
    /// Enable edge detection for an input
    ArmDetection(TriggerSource),
    /// Switch the contact measurement relay
    MeasureRelay(bool),
    /// Sound the buzzer (ms)
    Beep(u32),
    RequestRedraw,
    ResetActivity,
    /// Trigger condition released before the hold time ran out
    Dropped,
    /// Start a timed cycle from the current settings
    StartCycle,
    /// Continuous weld: switch on at the next crossing
    BeginRun,
    /// Continuous weld: switch off at the next crossing
    EndRun,
    /// Continuous weld: stop immediately
    HaltRun,
    /// Return the cycle to `Wait`
    ResetStage,
    /// Park the cycle in `End`
    Park,
}

/// Actions from one step; a step never produces more than a handful
pub type TriggerActions = Vec<TriggerAction, 8>;

/// Trigger arbiter
#[derive(Debug, Clone, Default)]
pub struct TriggerArbiter {
    state: TriggerState,
    /// Entry time of `Armed`, or start of the cooldown
    since: Tick,
    /// Hold time required in `Armed` (ticks)
    hold: Tick,
    last_chirp: Tick,
}

impl TriggerArbiter {
    pub const fn new() -> Self {
        Self {
            state: TriggerState::Idle,
            since: 0,
            hold: 0,
            last_chirp: 0,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Abandon whatever was in progress and wait for the inter-weld delay
    pub fn force_cooldown(&mut self, now: Tick) {
        self.state = TriggerState::Cooldown;
        self.since = now;
    }

    /// Advance the state machine by one service pass
    pub fn step(&mut self, settings: &WeldSettings, inputs: &TriggerInputs) -> TriggerActions {
        let mut actions = TriggerActions::new();

        match self.state {
            TriggerState::Idle => self.step_idle(settings, inputs, &mut actions),
            TriggerState::Armed => self.step_armed(settings, inputs, &mut actions),
            TriggerState::Firing => self.step_firing(settings, inputs, &mut actions),
            TriggerState::Cooldown => self.step_cooldown(settings, inputs, &mut actions),
        }

        actions
    }

    fn step_idle(&mut self, settings: &WeldSettings, inputs: &TriggerInputs, actions: &mut TriggerActions) {
        if self.lockout(inputs, actions) {
            return;
        }

        if inputs.stage == WeldStage::Wait && inputs.enabled {
            let relay = settings.trigger == TriggerSource::Contact;
            push(actions, TriggerAction::MeasureRelay(relay));
            push(actions, TriggerAction::ArmDetection(settings.trigger));
        }

        if inputs.edge && inputs.enabled {
            let hold_ms = match (settings.trigger, settings.weld_type) {
                (TriggerSource::FootSwitch, WeldType::Continuous) => MIN_FOOT_SWITCH_MS,
                _ => u32::from(settings.trigger_delay_ms),
            };
            self.state = TriggerState::Armed;
            self.since = inputs.now;
            self.hold = ms_to_ticks(hold_ms);
            push(actions, TriggerAction::RequestRedraw);
            push(actions, TriggerAction::Beep(BEEP_TRIGGER_MS));
        }
    }

    fn step_armed(&mut self, settings: &WeldSettings, inputs: &TriggerInputs, actions: &mut TriggerActions) {
        if !inputs.enabled {
            self.state = TriggerState::Idle;
            push(actions, TriggerAction::RequestRedraw);
            return;
        }

        let held = match settings.trigger {
            TriggerSource::Contact => inputs.contact,
            TriggerSource::FootSwitch => inputs.foot_switch,
        };

        if !held {
            self.state = TriggerState::Idle;
            push(actions, TriggerAction::Dropped);
            push(actions, TriggerAction::Beep(BEEP_TRIGGER_MS));
            push(actions, TriggerAction::RequestRedraw);
        } else if expired(inputs.now, self.since, self.hold) {
            self.state = TriggerState::Firing;
            self.last_chirp = inputs.now;
            push(actions, TriggerAction::MeasureRelay(false));
            push(actions, TriggerAction::Beep(BEEP_FIRE_MS));
        }
    }

    fn step_firing(&mut self, settings: &WeldSettings, inputs: &TriggerInputs, actions: &mut TriggerActions) {
        match settings.weld_type {
            WeldType::Continuous => {
                if !inputs.foot_switch {
                    push(actions, TriggerAction::EndRun);
                    self.force_cooldown(inputs.now);
                } else if !inputs.enabled {
                    push(actions, TriggerAction::HaltRun);
                    self.force_cooldown(inputs.now);
                } else if inputs.stage == WeldStage::End {
                    // halted underneath us; a new run needs a fresh trigger
                    self.force_cooldown(inputs.now);
                } else {
                    if expired(inputs.now, self.last_chirp, ms_to_ticks(CONTINUOUS_WARN_MS)) {
                        self.last_chirp = inputs.now;
                        push(actions, TriggerAction::Beep(BEEP_CHIRP_MS));
                        push(actions, TriggerAction::ResetActivity);
                    }
                    if inputs.stage != WeldStage::Run {
                        push(actions, TriggerAction::BeginRun);
                    }
                }
            }
            WeldType::SinglePulse | WeldType::DoublePulse => {
                if inputs.enabled {
                    push(actions, TriggerAction::MeasureRelay(false));
                    push(actions, TriggerAction::StartCycle);
                    push(actions, TriggerAction::ResetActivity);
                }
                self.force_cooldown(inputs.now);
            }
        }
    }

    fn step_cooldown(&mut self, settings: &WeldSettings, inputs: &TriggerInputs, actions: &mut TriggerActions) {
        if self.lockout(inputs, actions) {
            return;
        }

        // the delay runs from the end of the weld
        let settled = matches!(inputs.stage, WeldStage::Wait | WeldStage::End);
        if !inputs.engine_idle || !settled {
            self.since = inputs.now;
            return;
        }

        let held = match settings.trigger {
            TriggerSource::Contact => {
                if inputs.enabled {
                    push(actions, TriggerAction::MeasureRelay(true));
                }
                inputs.contact
            }
            TriggerSource::FootSwitch => inputs.foot_switch,
        };

        if held {
            self.since = inputs.now;
        } else if expired(inputs.now, self.since, ms_to_ticks(INTERWELD_DELAY_MS)) {
            self.state = TriggerState::Idle;
            push(actions, TriggerAction::ResetStage);
            push(actions, TriggerAction::RequestRedraw);
        }
    }

    /// Park the machine while the UI reports no recent activity
    fn lockout(&mut self, inputs: &TriggerInputs, actions: &mut TriggerActions) -> bool {
        let settled = matches!(inputs.stage, WeldStage::Wait | WeldStage::End);
        if inputs.ui_active || !settled || !inputs.engine_idle {
            return false;
        }

        if inputs.stage != WeldStage::End {
            push(actions, TriggerAction::Park);
        }
        // foot switch still wakes the UI
        push(actions, TriggerAction::ArmDetection(TriggerSource::FootSwitch));
        self.force_cooldown(inputs.now);
        true
    }
}

fn push(actions: &mut TriggerActions, action: TriggerAction) {
    // capacity covers the longest step
    let _ = actions.push(action);
}
