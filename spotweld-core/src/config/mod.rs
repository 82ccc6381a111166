//! Configuration types
//!
//! Weld settings, their bounds, and the validation error reported when a
//! setting is unusable.

pub mod limits;
pub mod types;

pub use limits::*;
pub use types::*;

/// A weld setting that cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulse 0 length out of bounds
    Pulse0Length,
    /// Pulse 1 length out of bounds
    Pulse1Length,
    /// Inter-pulse delay out of bounds
    InterpulseDelay,
    /// Trigger delay out of bounds
    TriggerDelay,
    /// Unknown weld type
    WeldType,
    /// Unknown trigger source
    TriggerSource,
}

impl ConfigError {
    /// Result code reported to the UI collaborator
    pub fn code(self) -> i8 {
        match self {
            Self::Pulse0Length => -1,
            Self::Pulse1Length => -2,
            Self::InterpulseDelay => -3,
            Self::TriggerDelay => -4,
            Self::WeldType => -5,
            Self::TriggerSource => -7,
        }
    }
}
