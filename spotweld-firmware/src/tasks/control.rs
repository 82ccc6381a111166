//! Weld control loop
//!
//! Runs the weld core service routine and reports what it recorded.

use defmt::*;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use spotweld_core::state::TimedEvent;

use crate::board::FwWelder;

/// Service interval in milliseconds
pub const SERVICE_INTERVAL_MS: u64 = 2;

/// Signal to run the service routine without waiting for the next interval
pub static SERVICE_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::task]
pub async fn control_task(welder: &'static FwWelder) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(SERVICE_INTERVAL_MS));
    let mut dropped = 0;

    loop {
        select(ticker.next(), SERVICE_REQUEST.wait()).await;
        welder.service();

        while let Some(event) = welder.pop_event() {
            report(&event);
        }

        let now_dropped = welder.dropped_events();
        if now_dropped != dropped {
            warn!("{} weld events dropped", now_dropped.wrapping_sub(dropped));
            dropped = now_dropped;
        }

        if welder.with_ui(|ui| ui.take_redraw()) {
            info!(
                "Status: enabled={} stage={} trigger={}",
                welder.is_weld_enabled(),
                welder.active_stage(),
                welder.is_weld_triggered()
            );
        }
    }
}

fn report(event: &TimedEvent) {
    if event.event.is_fault() {
        error!("[{}] {}", event.at, event.event);
    } else {
        info!("[{}] {}", event.at, event.event);
    }
}
