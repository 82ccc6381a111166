//! Peripheral traits
//!
//! The core issues discrete ON/OFF commands and reads discrete pin states.
//! The only analog value is the contact trigger threshold forwarded to a
//! DAC-like output.

/// Weld output (the SCR/MOSFET gate driving the discharge)
pub trait WeldOutput {
    /// Switch the weld output on or off
    fn set_weld(&mut self, on: bool);

    /// Check if the weld output is currently on
    fn is_weld_on(&self) -> bool;
}

/// Contact measurement relay
///
/// Connects the electrode sense circuit used by the contact trigger.
/// Must be open while welding.
pub trait MeasureRelay {
    /// Energize or release the relay
    fn set_measure_relay(&mut self, on: bool);
}

/// Trigger sense inputs
///
/// Takes `&mut self` because embedded-hal input reads require mutable access.
pub trait TriggerSense {
    /// Electrodes are touching the work piece
    fn contact_sensed(&mut self) -> bool;

    /// Foot switch is pressed
    fn foot_switch_pressed(&mut self) -> bool;
}

/// Contact trigger threshold output
pub trait ThresholdOutput {
    /// Program the comparator threshold level
    fn set_threshold(&mut self, level: u8);
}

/// Audible alert
pub trait Buzzer {
    /// Switch the buzzer on or off
    fn set_buzzer(&mut self, on: bool);
}

/// Everything the weld core needs from the board
pub trait WelderHardware: WeldOutput + MeasureRelay + TriggerSense + ThresholdOutput + Buzzer {}

impl<T> WelderHardware for T where
    T: WeldOutput + MeasureRelay + TriggerSense + ThresholdOutput + Buzzer
{
}
