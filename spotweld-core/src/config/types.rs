//! Weld settings
//!
//! The settings are owned by the configuration collaborator, which loads
//! them from non-volatile storage and writes back UI edits. The core only
//! reads them, and only between weld cycles.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Factory default weld settings (ms)
pub const DEFAULT_PULSE0_MS: u16 = 250;
pub const DEFAULT_PULSE1_MS: u16 = 300;
pub const DEFAULT_INTERPULSE_MS: u16 = 100;
pub const DEFAULT_TRIGGER_DELAY_MS: u16 = 100;
pub const DEFAULT_CONTACT_THRESHOLD: u8 = 128;

/// What starts a weld
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TriggerSource {
    /// Explicit foot switch press
    #[default]
    FootSwitch,
    /// Electrodes touching the work piece
    Contact,
}

impl TriggerSource {
    /// Decode the stored numeric value
    pub fn from_raw(raw: u16) -> Result<Self, ConfigError> {
        match raw {
            0 => Ok(Self::FootSwitch),
            1 => Ok(Self::Contact),
            _ => Err(ConfigError::TriggerSource),
        }
    }

    /// Stored numeric value
    pub fn to_raw(self) -> u16 {
        match self {
            Self::FootSwitch => 0,
            Self::Contact => 1,
        }
    }
}

/// Weld pulse pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WeldType {
    /// Output on for as long as the foot switch is held
    #[default]
    Continuous,
    /// One timed pulse
    SinglePulse,
    /// Two timed pulses separated by a cooling gap
    DoublePulse,
}

impl WeldType {
    /// Decode the stored numeric value
    pub fn from_raw(raw: u16) -> Result<Self, ConfigError> {
        match raw {
            0 => Ok(Self::Continuous),
            1 => Ok(Self::SinglePulse),
            2 => Ok(Self::DoublePulse),
            _ => Err(ConfigError::WeldType),
        }
    }

    /// Stored numeric value
    pub fn to_raw(self) -> u16 {
        match self {
            Self::Continuous => 0,
            Self::SinglePulse => 1,
            Self::DoublePulse => 2,
        }
    }
}

/// Weld configuration read by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeldSettings {
    /// First pulse length (ms)
    pub pulse0_ms: u16,
    /// Second pulse length (ms), double pulse only
    pub pulse1_ms: u16,
    /// Cooling gap between the pulses (ms)
    pub interpulse_ms: u16,
    /// How long the trigger condition must hold before firing (ms)
    pub trigger_delay_ms: u16,
    /// Trigger source
    pub trigger: TriggerSource,
    /// Pulse pattern
    pub weld_type: WeldType,
    /// Contact sense comparator threshold (DAC code)
    pub contact_threshold: u8,
}

impl Default for WeldSettings {
    fn default() -> Self {
        Self {
            pulse0_ms: DEFAULT_PULSE0_MS,
            pulse1_ms: DEFAULT_PULSE1_MS,
            interpulse_ms: DEFAULT_INTERPULSE_MS,
            trigger_delay_ms: DEFAULT_TRIGGER_DELAY_MS,
            trigger: TriggerSource::FootSwitch,
            weld_type: WeldType::Continuous,
            contact_threshold: DEFAULT_CONTACT_THRESHOLD,
        }
    }
}

impl WeldSettings {
    /// Decode settings handed over by the storage collaborator
    ///
    /// Continuous welding is only possible from the foot switch, so a
    /// continuous configuration always comes back with that trigger.
    pub fn from_raw(raw: &RawWeldSettings) -> Result<Self, ConfigError> {
        let weld_type = WeldType::from_raw(raw.weld_type)?;
        let trigger = match weld_type {
            WeldType::Continuous => TriggerSource::FootSwitch,
            _ => TriggerSource::from_raw(raw.trigger)?,
        };

        Ok(Self {
            pulse0_ms: raw.pulse0_ms,
            pulse1_ms: raw.pulse1_ms,
            interpulse_ms: raw.interpulse_ms,
            trigger_delay_ms: raw.trigger_delay_ms,
            trigger,
            weld_type,
            contact_threshold: raw.contact_threshold,
        })
    }

    /// Numeric form for the storage collaborator
    pub fn to_raw(&self) -> RawWeldSettings {
        RawWeldSettings {
            pulse0_ms: self.pulse0_ms,
            pulse1_ms: self.pulse1_ms,
            interpulse_ms: self.interpulse_ms,
            trigger_delay_ms: self.trigger_delay_ms,
            trigger: self.trigger.to_raw(),
            weld_type: self.weld_type.to_raw(),
            contact_threshold: self.contact_threshold,
        }
    }
}

/// Settings as stored, before the enums are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawWeldSettings {
    pub pulse0_ms: u16,
    pub pulse1_ms: u16,
    pub interpulse_ms: u16,
    pub trigger_delay_ms: u16,
    pub trigger: u16,
    pub weld_type: u16,
    pub contact_threshold: u8,
}
