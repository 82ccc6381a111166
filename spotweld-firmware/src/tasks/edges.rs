//! Input edge tasks

use defmt::*;
use embassy_rp::gpio::Input;
use portable_atomic::Ordering;
use spotweld_core::mains::Polarity;

use super::control::SERVICE_REQUEST;
use crate::board::{FwWelder, CONTACT_LEVEL, FOOT_SWITCH_LEVEL};

/// Mains zero-crossing detector
///
/// The optocoupler level after the edge gives the half-wave polarity.
#[embassy_executor::task]
pub async fn zero_cross_task(welder: &'static FwWelder, mut pin: Input<'static>) {
    info!("Zero cross task started");

    loop {
        pin.wait_for_any_edge().await;
        let polarity = if pin.is_high() {
            Polarity::High
        } else {
            Polarity::Low
        };
        welder.on_zero_cross(polarity);
    }
}

#[embassy_executor::task]
pub async fn contact_task(welder: &'static FwWelder, mut pin: Input<'static>) {
    info!("Contact sense task started");
    CONTACT_LEVEL.store(pin.is_high(), Ordering::Release);

    loop {
        pin.wait_for_any_edge().await;
        CONTACT_LEVEL.store(pin.is_high(), Ordering::Release);
        welder.on_contact_edge();
        SERVICE_REQUEST.signal(());
    }
}

#[embassy_executor::task]
pub async fn foot_switch_task(welder: &'static FwWelder, mut pin: Input<'static>) {
    info!("Foot switch task started");
    FOOT_SWITCH_LEVEL.store(pin.is_high(), Ordering::Release);

    loop {
        pin.wait_for_any_edge().await;
        FOOT_SWITCH_LEVEL.store(pin.is_high(), Ordering::Release);
        welder.on_foot_switch_edge();
        SERVICE_REQUEST.signal(());
    }
}
