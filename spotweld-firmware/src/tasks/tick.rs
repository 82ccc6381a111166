//! Time base tasks
//!
//! The system tick drives timeouts, the beeper and crossing deadlines.
//! The weld tick paces the timed pulse stages.

use defmt::*;
use embassy_time::{Duration, Ticker};
use spotweld_core::timing::{MS_PER_SYSTICK, MS_PER_WELD_TICK};

use crate::board::FwWelder;

#[embassy_executor::task]
pub async fn system_tick_task(welder: &'static FwWelder) {
    info!("System tick task started ({}ms)", MS_PER_SYSTICK);

    let mut ticker = Ticker::every(Duration::from_millis(MS_PER_SYSTICK as u64));

    loop {
        ticker.next().await;
        welder.on_system_tick();
    }
}

#[embassy_executor::task]
pub async fn weld_tick_task(welder: &'static FwWelder) {
    info!("Weld tick task started ({}ms)", MS_PER_WELD_TICK);

    let mut ticker = Ticker::every(Duration::from_millis(MS_PER_WELD_TICK as u64));

    loop {
        ticker.next().await;
        welder.on_weld_tick();
    }
}
