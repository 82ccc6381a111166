//! Board bundle
//!
//! Collects the switched outputs, trigger inputs and threshold DAC of a
//! weld controller into one value implementing every hardware trait the
//! weld core needs.

use embedded_hal::digital::{InputPin, OutputPin};
use spotweld_core::traits::{Buzzer, MeasureRelay, ThresholdOutput, TriggerSense, WeldOutput};

use crate::input::GpioInput;
use crate::output::GpioSwitch;

/// Weld controller peripherals
pub struct WeldBoard<W, R, B, C, F, D> {
    weld: GpioSwitch<W>,
    relay: GpioSwitch<R>,
    buzzer: GpioSwitch<B>,
    contact: GpioInput<C>,
    foot_switch: GpioInput<F>,
    threshold: D,
    /// Output writes that failed
    pin_errors: u32,
}

impl<W, R, B, C, F, D> WeldBoard<W, R, B, C, F, D>
where
    W: OutputPin,
    R: OutputPin,
    B: OutputPin,
    C: InputPin,
    F: InputPin,
    D: ThresholdOutput,
{
    pub fn new(
        weld: GpioSwitch<W>,
        relay: GpioSwitch<R>,
        buzzer: GpioSwitch<B>,
        contact: GpioInput<C>,
        foot_switch: GpioInput<F>,
        threshold: D,
    ) -> Self {
        Self {
            weld,
            relay,
            buzzer,
            contact,
            foot_switch,
            threshold,
            pin_errors: 0,
        }
    }

    pub fn is_relay_on(&self) -> bool {
        self.relay.is_on()
    }

    pub fn is_buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }

    pub fn pin_errors(&self) -> u32 {
        self.pin_errors
    }

    pub fn threshold(&self) -> &D {
        &self.threshold
    }

    fn count<E>(&mut self, result: Result<(), E>) {
        if result.is_err() {
            self.pin_errors = self.pin_errors.wrapping_add(1);
        }
    }
}

impl<W, R, B, C, F, D> WeldOutput for WeldBoard<W, R, B, C, F, D>
where
    W: OutputPin,
    R: OutputPin,
    B: OutputPin,
    C: InputPin,
    F: InputPin,
    D: ThresholdOutput,
{
    fn set_weld(&mut self, on: bool) {
        let result = self.weld.set(on);
        if result.is_err() {
            #[cfg(feature = "defmt")]
            defmt::error!("Weld output write failed (on={})", on);
        }
        self.count(result);
    }

    fn is_weld_on(&self) -> bool {
        self.weld.is_on()
    }
}

impl<W, R, B, C, F, D> MeasureRelay for WeldBoard<W, R, B, C, F, D>
where
    W: OutputPin,
    R: OutputPin,
    B: OutputPin,
    C: InputPin,
    F: InputPin,
    D: ThresholdOutput,
{
    fn set_measure_relay(&mut self, on: bool) {
        let result = self.relay.set(on);
        self.count(result);
    }
}

impl<W, R, B, C, F, D> TriggerSense for WeldBoard<W, R, B, C, F, D>
where
    W: OutputPin,
    R: OutputPin,
    B: OutputPin,
    C: InputPin,
    F: InputPin,
    D: ThresholdOutput,
{
    fn contact_sensed(&mut self) -> bool {
        self.contact.is_asserted()
    }

    fn foot_switch_pressed(&mut self) -> bool {
        self.foot_switch.is_asserted()
    }
}

impl<W, R, B, C, F, D> ThresholdOutput for WeldBoard<W, R, B, C, F, D>
where
    W: OutputPin,
    R: OutputPin,
    B: OutputPin,
    C: InputPin,
    F: InputPin,
    D: ThresholdOutput,
{
    fn set_threshold(&mut self, level: u8) {
        self.threshold.set_threshold(level);
    }
}

impl<W, R, B, C, F, D> Buzzer for WeldBoard<W, R, B, C, F, D>
where
    W: OutputPin,
    R: OutputPin,
    B: OutputPin,
    C: InputPin,
    F: InputPin,
    D: ThresholdOutput,
{
    fn set_buzzer(&mut self, on: bool) {
        let result = self.buzzer.set(on);
        self.count(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dac::mcp48xx::mock::MockSpi;
    use crate::dac::{Mcp48xx, Resolution};
    use crate::input::mock::MockInput;
    use crate::output::mock::{BrokenPin, MockPin};
    use spotweld_core::traits::WelderHardware;

    type TestBoard<W> = WeldBoard<W, MockPin, MockPin, MockInput, MockInput, Mcp48xx<MockSpi>>;

    fn board() -> TestBoard<MockPin> {
        board_with(MockPin::default())
    }

    fn board_with<W: OutputPin>(weld: W) -> TestBoard<W> {
        WeldBoard::new(
            GpioSwitch::new_active_high(weld),
            GpioSwitch::new_active_low(MockPin::default()),
            GpioSwitch::new_active_high(MockPin::default()),
            GpioInput::new_active_high(MockInput::default()),
            GpioInput::new_active_low(MockInput { high: true }),
            Mcp48xx::new(MockSpi::default(), Resolution::Bits8),
        )
    }

    #[test]
    fn test_outputs_start_off() {
        let board = board();
        assert!(!board.is_weld_on());
        assert!(!board.is_relay_on());
        assert!(!board.is_buzzer_on());
        // Active-low relay idles high
        assert!(board.relay.pin().high);
    }

    #[test]
    fn test_switches_outputs() {
        let mut board = board();
        board.set_weld(true);
        board.set_measure_relay(true);
        board.set_buzzer(true);
        assert!(board.is_weld_on());
        assert!(board.is_relay_on());
        assert!(board.is_buzzer_on());
        assert!(!board.relay.pin().high);
        assert_eq!(board.pin_errors(), 0);
    }

    #[test]
    fn test_reads_trigger_inputs() {
        let mut board = board();
        assert!(!board.contact_sensed());
        assert!(!board.foot_switch_pressed());

        board.contact.pin_mut().high = true;
        board.foot_switch.pin_mut().high = false;
        assert!(board.contact_sensed());
        assert!(board.foot_switch_pressed());
    }

    #[test]
    fn test_threshold_reaches_dac() {
        let mut board = board();
        board.set_threshold(200);
        assert_eq!(board.threshold().code(), Some(200));
    }

    #[test]
    fn test_failed_weld_write_stays_on() {
        let mut board = board_with(BrokenPin);
        board.set_weld(false);
        assert!(board.is_weld_on());
        assert_eq!(board.pin_errors(), 1);
    }

    #[test]
    fn test_is_welder_hardware() {
        fn accepts<H: WelderHardware>(_: &H) {}
        accepts(&board());
    }
}
