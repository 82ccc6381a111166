//! Time bases
//!
//! Two independent tick domains exist, each with a fixed ratio to
//! milliseconds:
//!
//! - System ticks (10 ms) for timeouts, trigger delays and alerts
//! - Weld ticks (50 ms) for sequencing weld cycle stages
//!
//! Both counters wrap. Durations are always computed with wrapping
//! subtraction, never by ordering two tick values.

pub mod beeper;
pub mod clock;
pub mod weld_timer;

pub use beeper::BeepTimer;
pub use clock::ClockSource;
pub use weld_timer::WeldTimeBase;

/// System tick count
pub type Tick = u32;

/// Weld tick count
pub type WeldTick = u32;

/// Milliseconds per system tick
pub const MS_PER_SYSTICK: u32 = 10;

/// Milliseconds per weld tick
pub const MS_PER_WELD_TICK: u32 = 50;

/// Convert milliseconds to system ticks (truncating)
pub const fn ms_to_ticks(ms: u32) -> Tick {
    ms / MS_PER_SYSTICK
}

/// Convert milliseconds to weld ticks (truncating)
pub const fn ms_to_weld_ticks(ms: u32) -> WeldTick {
    ms / MS_PER_WELD_TICK
}

/// Ticks elapsed from `since` to `now`, correct across wraparound
#[inline]
pub const fn elapsed(now: Tick, since: Tick) -> Tick {
    now.wrapping_sub(since)
}

/// True once strictly more than `duration` ticks have passed since `since`
#[inline]
pub const fn expired(now: Tick, since: Tick, duration: Tick) -> bool {
    elapsed(now, since) > duration
}
