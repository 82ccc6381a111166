//! Board wiring
//!
//! Pin assignments for the RP2040 weld controller:
//!
//! | Signal          | GPIO | Notes                                 |
//! |-----------------|------|---------------------------------------|
//! | Weld gate       | 2    | Active high, drives the SCR/MOSFET    |
//! | Measure relay   | 3    | Active high                           |
//! | Buzzer          | 4    | Active high                           |
//! | Zero cross      | 6    | Optocoupler output, level = polarity  |
//! | Contact sense   | 7    | Comparator output, active high        |
//! | Foot switch     | 8    | Switch to ground, pull-up             |
//! | DAC CS          | 17   | MCP4801 chip select                   |
//! | DAC SCK / SDI   | 18/19| SPI0                                  |
//!
//! Trigger inputs are owned by their edge tasks, which publish the current
//! level for the weld core to read.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::Delay;
use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_bus::spi::ExclusiveDevice;
use portable_atomic::{AtomicBool, Ordering};

use spotweld_core::Welder;
use spotweld_drivers::dac::Mcp48xx;
use spotweld_drivers::WeldBoard;

use crate::ui::LogUi;

/// Last level seen on the contact sense input
pub static CONTACT_LEVEL: AtomicBool = AtomicBool::new(false);

/// Last level seen on the foot switch input
pub static FOOT_SWITCH_LEVEL: AtomicBool = AtomicBool::new(true);

/// Input pin backed by a level published from an edge task
pub struct LevelPin(&'static AtomicBool);

impl LevelPin {
    pub const fn new(level: &'static AtomicBool) -> Self {
        Self(level)
    }
}

impl ErrorType for LevelPin {
    type Error = core::convert::Infallible;
}

impl InputPin for LevelPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.load(Ordering::Acquire))
    }
}

pub type DacSpi = ExclusiveDevice<Spi<'static, SPI0, Blocking>, Output<'static>, Delay>;

pub type Board = WeldBoard<
    Output<'static>,
    Output<'static>,
    Output<'static>,
    LevelPin,
    LevelPin,
    Mcp48xx<DacSpi>,
>;

pub type FwWelder = Welder<Board, LogUi>;
