//! Enable/disable gate
//!
//! Welding is only possible while the gate is enabled. Enabling validates
//! the settings and requires a live mains signal; disabling halts any cycle
//! in the same critical section.

use crate::config::{ConfigError, WeldLimits, WeldSettings};
use crate::mains::ZeroCrossMonitor;
use crate::sync::{CriticalSection, Shared};
use crate::traits::{MeasureRelay, ThresholdOutput, WeldOutput};
use crate::weld::WeldCycleEngine;

/// Master weld enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnableState {
    #[default]
    Disabled,
    Enabled,
}

/// Why welding could not be enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnableError {
    /// A setting is out of bounds
    Config(ConfigError),
    /// No AC zero crossing is being detected
    AcLost,
}

impl EnableError {
    /// Result code reported to the UI collaborator
    pub fn code(self) -> i8 {
        match self {
            Self::Config(e) => e.code(),
            Self::AcLost => -6,
        }
    }
}

impl From<ConfigError> for EnableError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Persistent fault that keeps the welder inert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// AC zero crossing lost (breaker open or sense circuit damaged)
    AcLost,
}

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Fault latched; welding blocked
    Fault(Fault),
}

/// Enable flag and latched fault
pub struct SafetyGate {
    enable: Shared<EnableState>,
    fault: Shared<Option<Fault>>,
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyGate {
    pub const fn new() -> Self {
        Self {
            enable: Shared::new(EnableState::Disabled),
            fault: Shared::new(None),
        }
    }

    /// Validate the settings and enable welding
    ///
    /// On success the threshold output is programmed and the weld time
    /// base started. Enabling an enabled gate only re-validates.
    pub fn enable<H: ThresholdOutput + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        settings: &WeldSettings,
        limits: &WeldLimits,
        zero_cross: &ZeroCrossMonitor,
        engine: &WeldCycleEngine,
        hw: &mut H,
    ) -> Result<(), EnableError> {
        limits.check(settings)?;

        if zero_cross.is_lost(cs) {
            return Err(EnableError::AcLost);
        }

        if self.enable.get(cs) == EnableState::Disabled {
            hw.set_threshold(settings.contact_threshold);
            self.enable.set(cs, EnableState::Enabled);
            engine.timer().start(cs);
        }
        Ok(())
    }

    /// Abort any cycle, switch the output off and clear the enable flag
    ///
    /// Returns true if the gate was enabled.
    pub fn emergency_halt<W: WeldOutput + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        engine: &WeldCycleEngine,
        output: &mut W,
    ) -> bool {
        engine.emergency_halt(cs, output);
        self.enable.replace(cs, EnableState::Disabled) == EnableState::Enabled
    }

    /// Halt any cycle and disable welding
    ///
    /// Returns true if the gate was enabled.
    pub fn disable<H: WeldOutput + MeasureRelay + ?Sized>(
        &self,
        cs: CriticalSection<'_>,
        engine: &WeldCycleEngine,
        hw: &mut H,
    ) -> bool {
        let was_enabled = self.emergency_halt(cs, engine, hw);
        if was_enabled {
            hw.set_measure_relay(false);
        }
        was_enabled
    }

    pub fn state(&self, cs: CriticalSection<'_>) -> EnableState {
        self.enable.get(cs)
    }

    pub fn is_enabled(&self, cs: CriticalSection<'_>) -> bool {
        self.enable.get(cs) == EnableState::Enabled
    }

    /// Latch a fault; returns false if one was already latched
    pub fn latch_fault(&self, cs: CriticalSection<'_>, fault: Fault) -> bool {
        self.fault.replace(cs, Some(fault)).is_none()
    }

    /// Clear the latched fault; returns the fault that was cleared
    pub fn clear_fault(&self, cs: CriticalSection<'_>) -> Option<Fault> {
        self.fault.replace(cs, None)
    }

    pub fn fault(&self, cs: CriticalSection<'_>) -> Option<Fault> {
        self.fault.get(cs)
    }

    pub fn status(&self, cs: CriticalSection<'_>) -> SafetyStatus {
        match self.fault.get(cs) {
            Some(fault) => SafetyStatus::Fault(fault),
            None => SafetyStatus::Ok,
        }
    }
}
