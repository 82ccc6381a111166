//! Spotweld - Spot Welder Firmware
//!
//! Main firmware binary for RP2040-based weld controllers. Weld pulses are
//! switched on AC zero crossings and triggered by electrode contact or a
//! foot switch.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_time::{Delay, Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use spotweld_core::config::WeldSettings;
use spotweld_core::mains::ZERO_CROSS_LOSS_MS;
use spotweld_core::Welder;
use spotweld_drivers::dac::{Mcp48xx, Resolution};
use spotweld_drivers::{GpioInput, GpioSwitch, WeldBoard};

use crate::board::{FwWelder, LevelPin, CONTACT_LEVEL, FOOT_SWITCH_LEVEL};
use crate::ui::LogUi;

mod board;
mod tasks;
mod ui;

/// DAC SPI clock
const DAC_SPI_HZ: u32 = 1_000_000;

static WELDER: StaticCell<FwWelder> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Spotweld firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Outputs start off; the weld gate first
    let weld = GpioSwitch::new_active_high(Output::new(p.PIN_2, Level::Low));
    let relay = GpioSwitch::new_active_high(Output::new(p.PIN_3, Level::Low));
    let buzzer = GpioSwitch::new_active_high(Output::new(p.PIN_4, Level::Low));

    // Threshold DAC on SPI0 (write only)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = DAC_SPI_HZ;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let spi_device = ExclusiveDevice::new(spi, cs, Delay).unwrap();

    let mut dac = Mcp48xx::new(spi_device, Resolution::Bits8);
    if dac.init().is_err() {
        warn!("DAC init failed, contact threshold unavailable");
    }
    info!("Threshold DAC initialized");

    // Trigger inputs are read through the levels their tasks publish
    let zero_cross = Input::new(p.PIN_6, Pull::None);
    let contact = Input::new(p.PIN_7, Pull::Down);
    let foot_switch = Input::new(p.PIN_8, Pull::Up);

    let board = WeldBoard::new(
        weld,
        relay,
        buzzer,
        GpioInput::new_active_high(LevelPin::new(&CONTACT_LEVEL)),
        GpioInput::new_active_low(LevelPin::new(&FOOT_SWITCH_LEVEL)),
        dac,
    );

    let settings = WeldSettings::default();
    info!(
        "Weld settings: type={} trigger={} p0={}ms p1={}ms gap={}ms delay={}ms",
        settings.weld_type,
        settings.trigger,
        settings.pulse0_ms,
        settings.pulse1_ms,
        settings.interpulse_ms,
        settings.trigger_delay_ms
    );

    let welder: &'static FwWelder = WELDER.init(Welder::new(board, LogUi::new(), settings));
    let limits = welder.limits();
    info!(
        "Weld limits: pulse {}..{}ms, delay {}..{}ms",
        limits.min_pulse_ms, limits.max_pulse_ms, limits.min_delay_ms, limits.max_delay_ms
    );

    // Spawn tasks
    spawner.spawn(tasks::system_tick_task(welder)).unwrap();
    spawner.spawn(tasks::weld_tick_task(welder)).unwrap();
    spawner.spawn(tasks::zero_cross_task(welder, zero_cross)).unwrap();
    spawner.spawn(tasks::contact_task(welder, contact)).unwrap();
    spawner.spawn(tasks::foot_switch_task(welder, foot_switch)).unwrap();
    spawner.spawn(tasks::control_task(welder)).unwrap();

    info!("All tasks spawned");

    // Give the zero cross detector a full loss window before arming
    Timer::after(Duration::from_millis(2 * ZERO_CROSS_LOSS_MS as u64)).await;

    match welder.enable_weld() {
        Ok(()) => info!("Welding enabled"),
        Err(e) => error!("Welding not enabled: {} (code {})", e, e.code()),
    }

    loop {
        Timer::after_secs(60).await;
        trace!(
            "Heartbeat: tick={} status={}",
            welder.now(),
            welder.safety_status()
        );
    }
}
