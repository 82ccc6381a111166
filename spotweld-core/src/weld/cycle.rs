//! Weld cycle description
//!
//! A cycle is requested in milliseconds and converted once, at start, to
//! cumulative weld-tick boundaries measured from the first serviced tick.

use crate::config::{WeldSettings, WeldType};
use crate::timing::{ms_to_weld_ticks, Tick, WeldTick};

/// Stage of the weld cycle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WeldStage {
    /// Ready for a new cycle
    #[default]
    Wait,
    /// First pulse, output on
    Pulse0,
    /// Inter-pulse gap, output off
    Delay,
    /// Second pulse, output on
    Pulse1,
    /// Continuous weld, output on while the foot switch is held
    Run,
    /// Cycle complete
    End,
}

impl WeldStage {
    /// Stages in which the weld output may be on
    pub fn output_allowed(self) -> bool {
        matches!(self, Self::Pulse0 | Self::Pulse1 | Self::Run)
    }

    /// Stages that can be set from outside the cycle engine
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Wait | Self::Run | Self::End)
    }
}

/// Pulse pattern of a timed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleKind {
    #[default]
    Single,
    Double,
}

/// Timed cycle request in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeldCycleSpec {
    pub pulse0_ms: u16,
    pub pulse1_ms: u16,
    pub interpulse_ms: u16,
    pub kind: CycleKind,
}

impl WeldCycleSpec {
    /// Build the cycle request for the configured pulse mode
    ///
    /// Continuous welding has no timed cycle and returns `None`.
    pub fn from_settings(settings: &WeldSettings) -> Option<Self> {
        let kind = match settings.weld_type {
            WeldType::Continuous => return None,
            WeldType::SinglePulse => CycleKind::Single,
            WeldType::DoublePulse => CycleKind::Double,
        };
        Some(Self {
            pulse0_ms: settings.pulse0_ms,
            pulse1_ms: settings.pulse1_ms,
            interpulse_ms: settings.interpulse_ms,
            kind,
        })
    }
}

/// Cumulative stage boundaries in weld ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleBoundaries {
    pub pulse0_end: WeldTick,
    pub delay_end: WeldTick,
    pub pulse1_end: WeldTick,
}

impl CycleBoundaries {
    /// Convert a request into boundaries
    ///
    /// Each boundary is computed from the summed milliseconds so rounding
    /// does not accumulate across stages.
    pub fn compute(spec: &WeldCycleSpec) -> Self {
        let p0 = u32::from(spec.pulse0_ms);
        let ip = u32::from(spec.interpulse_ms);
        let p1 = u32::from(spec.pulse1_ms);
        Self {
            pulse0_end: ms_to_weld_ticks(p0),
            delay_end: ms_to_weld_ticks(p0 + ip),
            pulse1_end: ms_to_weld_ticks(p0 + ip + p1),
        }
    }
}

/// Output change waiting for the next zero crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrossingAction {
    StartPulse0,
    StartPulse1,
    StartRun,
    StopRun,
}

/// A requested crossing and when it was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingCrossing {
    pub action: CrossingAction,
    /// System tick of the request, for the loss timeout
    pub requested_at: Tick,
    /// Weld-tick counter value at the request, for the offset
    pub requested_weld: WeldTick,
}

/// The single system-wide weld cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveCycle {
    pub kind: CycleKind,
    pub stage: WeldStage,
    pub bounds: CycleBoundaries,
    /// Serviced weld tick at which the current stage ends
    pub target: WeldTick,
    /// Weld ticks spent waiting for crossings
    pub offset: WeldTick,
    /// A timed cycle has been started and not yet finished
    pub armed: bool,
    pub pending: Option<PendingCrossing>,
}

impl ActiveCycle {
    pub const IDLE: Self = Self {
        kind: CycleKind::Single,
        stage: WeldStage::Wait,
        bounds: CycleBoundaries {
            pulse0_end: 0,
            delay_end: 0,
            pulse1_end: 0,
        },
        target: 0,
        offset: 0,
        armed: false,
        pending: None,
    };

    /// No timed cycle armed and no crossing outstanding
    pub fn is_idle(&self) -> bool {
        !self.armed && self.pending.is_none()
    }
}

impl Default for ActiveCycle {
    fn default() -> Self {
        Self::IDLE
    }
}
