//! GPIO trigger inputs

use embedded_hal::digital::InputPin;

/// Digital input with a configurable active level
///
/// A pin that cannot be read counts as not asserted, so a broken input
/// never starts a weld.
pub struct GpioInput<P> {
    pin: P,
    /// If true, asserted = pin LOW (switch to ground with pull-up)
    active_low: bool,
}

impl<P: InputPin> GpioInput<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    /// Read the logical input state
    pub fn is_asserted(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(_) => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}
