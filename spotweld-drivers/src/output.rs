//! GPIO switched outputs
//!
//! Weld gate, measurement relay and buzzer are all plain on/off outputs,
//! driven directly or through a MOSFET/SSR.

use embedded_hal::digital::OutputPin;

/// GPIO on/off output
///
/// The pin can be configured as active-high (default) or active-low.
pub struct GpioSwitch<P> {
    pin: P,
    /// If true, ON = pin LOW
    inverted: bool,
    /// Last state successfully written to the pin
    on: bool,
}

impl<P: OutputPin> GpioSwitch<P> {
    /// Create a new switched output, driven off
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to control
    /// - `inverted`: If true, the output is ON when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut switch = Self {
            pin,
            inverted,
            // Assume on until the pin confirms otherwise
            on: true,
        };
        let _ = switch.set(false);
        switch
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    /// Drive the output
    ///
    /// On a pin error the logical state is left unchanged, so a failed
    /// switch-off keeps reporting the output as on.
    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on != self.inverted {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    #[cfg(test)]
    pub(crate) fn pin(&self) -> &P {
        &self.pin
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{BrokenPin, MockPin};
    use super::*;

    #[test]
    fn test_active_high_switch() {
        let mut switch = GpioSwitch::new_active_high(MockPin::default());

        // Initially off
        assert!(!switch.is_on());
        assert!(!switch.pin.high);

        switch.set(true).unwrap();
        assert!(switch.is_on());
        assert!(switch.pin.high);

        switch.set(false).unwrap();
        assert!(!switch.is_on());
        assert!(!switch.pin.high);
    }

    #[test]
    fn test_active_low_switch() {
        let mut switch = GpioSwitch::new_active_low(MockPin::default());

        // Off is pin high for active-low
        assert!(!switch.is_on());
        assert!(switch.pin.high);

        switch.set(true).unwrap();
        assert!(switch.is_on());
        assert!(!switch.pin.high);
    }

    #[test]
    fn test_new_drives_pin_off() {
        let switch = GpioSwitch::new_active_high(MockPin::default());
        assert_eq!(switch.pin().writes, 1);
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let mut switch = GpioSwitch::new_active_high(BrokenPin);

        // Could never confirm off
        assert!(switch.is_on());
        assert!(switch.set(false).is_err());
        assert!(switch.is_on());
    }
}
