//! Weld setting bounds
//!
//! Checked before welding may be enabled. The inter-pulse delay and the
//! trigger delay share one pair of bounds.

use super::{ConfigError, WeldSettings};

/// Pulse length bounds (ms)
pub const MIN_PULSE_MS: u16 = 50;
pub const MAX_PULSE_MS: u16 = 10_000;

/// Inter-pulse and trigger delay bounds (ms)
pub const MIN_DELAY_MS: u16 = 50;
pub const MAX_DELAY_MS: u16 = 1_000;

/// Configured min/max bounds for the weld settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeldLimits {
    pub min_pulse_ms: u16,
    pub max_pulse_ms: u16,
    pub min_delay_ms: u16,
    pub max_delay_ms: u16,
}

impl Default for WeldLimits {
    fn default() -> Self {
        Self {
            min_pulse_ms: MIN_PULSE_MS,
            max_pulse_ms: MAX_PULSE_MS,
            min_delay_ms: MIN_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
        }
    }
}

impl WeldLimits {
    /// Validate settings, reporting the first field out of bounds
    ///
    /// Fields are checked in a fixed order: pulse 0, pulse 1, inter-pulse
    /// delay, trigger delay.
    pub fn check(&self, settings: &WeldSettings) -> Result<(), ConfigError> {
        let pulse = self.min_pulse_ms..=self.max_pulse_ms;
        let delay = self.min_delay_ms..=self.max_delay_ms;

        if !pulse.contains(&settings.pulse0_ms) {
            return Err(ConfigError::Pulse0Length);
        }
        if !pulse.contains(&settings.pulse1_ms) {
            return Err(ConfigError::Pulse1Length);
        }
        if !delay.contains(&settings.interpulse_ms) {
            return Err(ConfigError::InterpulseDelay);
        }
        if !delay.contains(&settings.trigger_delay_ms) {
            return Err(ConfigError::TriggerDelay);
        }
        Ok(())
    }
}
