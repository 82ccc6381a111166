//! MCP4801/4811/4821 single-channel SPI DAC
//!
//! Programs the comparator reference for the contact trigger.
//!
//! Each write is one 16-bit command, MSB first:
//!
//! ```text
//! bit 15    14    13    12    11..0
//!     A/B   -     GA    SHDN  data (left aligned for 8/10 bit parts)
//! ```
//!
//! LDAC is expected to be tied low so the output latches when chip select
//! is released.

use embedded_hal::spi::SpiDevice;
use spotweld_core::traits::ThresholdOutput;

/// SHDN bit: output active
const ACTIVE: u8 = 0x10;

/// Output gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Vout = Vref * D / 4096
    X1,
    /// Vout = 2 * Vref * D / 4096
    X2,
}

impl Gain {
    fn bits(self) -> u8 {
        match self {
            Gain::X1 => 0x20,
            Gain::X2 => 0x00,
        }
    }
}

/// Converter resolution of the fitted part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// MCP4801
    #[default]
    Bits8,
    /// MCP4811
    Bits10,
    /// MCP4821
    Bits12,
}

impl Resolution {
    /// Left shift placing a code in the 12-bit data field
    fn shift(self) -> u8 {
        match self {
            Resolution::Bits8 => 4,
            Resolution::Bits10 => 2,
            Resolution::Bits12 => 0,
        }
    }

    /// Largest code the part accepts
    pub fn max_code(self) -> u16 {
        0x0FFF >> self.shift()
    }
}

/// Build the two command bytes for an active output
pub fn command(code: u16, gain: Gain, resolution: Resolution) -> [u8; 2] {
    let out = code.min(resolution.max_code()) << resolution.shift();
    [
        ACTIVE | gain.bits() | ((out & 0x0F00) >> 8) as u8,
        (out & 0x00FF) as u8,
    ]
}

/// MCP48x1 DAC on an SPI bus
pub struct Mcp48xx<SPI> {
    spi: SPI,
    resolution: Resolution,
    /// Gain used when programming the trigger threshold
    threshold_gain: Gain,
    /// Last code written successfully
    code: Option<u16>,
    write_errors: u32,
}

impl<SPI: SpiDevice> Mcp48xx<SPI> {
    pub fn new(spi: SPI, resolution: Resolution) -> Self {
        Self {
            spi,
            resolution,
            threshold_gain: Gain::X2,
            code: None,
            write_errors: 0,
        }
    }

    /// Use a different gain for [`ThresholdOutput`]
    pub fn with_threshold_gain(mut self, gain: Gain) -> Self {
        self.threshold_gain = gain;
        self
    }

    /// Bring the output up at zero
    pub fn init(&mut self) -> Result<(), SPI::Error> {
        self.write([ACTIVE, 0x00])?;
        self.code = Some(0);
        Ok(())
    }

    /// Set the output code, clamped to the part's resolution
    pub fn set_value(&mut self, code: u16, gain: Gain) -> Result<(), SPI::Error> {
        let code = code.min(self.resolution.max_code());
        self.write(command(code, gain, self.resolution))?;
        self.code = Some(code);
        Ok(())
    }

    /// Put the output into high-impedance shutdown
    pub fn shutdown(&mut self) -> Result<(), SPI::Error> {
        self.write([0x00, 0x00])?;
        self.code = None;
        Ok(())
    }

    /// Last code written, `None` while shut down or never written
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// Writes that failed on the bus
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    fn write(&mut self, frame: [u8; 2]) -> Result<(), SPI::Error> {
        self.spi.write(&frame).inspect_err(|_| {
            self.write_errors = self.write_errors.wrapping_add(1);
        })
    }
}

impl<SPI: SpiDevice> ThresholdOutput for Mcp48xx<SPI> {
    fn set_threshold(&mut self, level: u8) {
        // Scale the 8-bit level to full range of the part
        let code = u16::from(level) << (4 - self.resolution.shift());
        if self.set_value(code, self.threshold_gain).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("DAC threshold write failed ({} errors)", self.write_errors);
        }
    }
}
