//! AC zero-crossing monitor
//!
//! The zero-crossing interrupt records every edge of the mains sense
//! signal. Weld output switching is aligned to these edges, and their
//! absence means the breaker is open or the sense circuit is damaged.

use crate::sync::{CriticalSection, Shared};
use crate::timing::{expired, ms_to_ticks, Tick};

/// A crossing must be seen within this window (ms)
pub const ZERO_CROSS_LOSS_MS: u32 = 100;

/// Level of the mains sense input just after the crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    #[default]
    Low,
    High,
}

/// Snapshot of the zero-crossing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZeroCrossStatus {
    /// A crossing occurred since the flag was last consumed
    pub detected: bool,
    /// Polarity of the most recent crossing
    pub polarity: Polarity,
    /// System tick of the most recent crossing
    pub last_seen: Tick,
    /// No crossing within the loss window
    pub lost: bool,
}

impl ZeroCrossStatus {
    const INITIAL: Self = Self {
        detected: false,
        polarity: Polarity::Low,
        last_seen: 0,
        lost: false,
    };
}

impl Default for ZeroCrossStatus {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Result of polling for a requested crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrossingPoll {
    /// A crossing arrived; the detected flag has been consumed
    Detected,
    /// Still inside the loss window
    Pending,
    /// The loss window ran out; `lost` is now set
    TimedOut,
}

/// Zero-crossing detector state shared with the edge interrupt
pub struct ZeroCrossMonitor {
    status: Shared<ZeroCrossStatus>,
    window: Tick,
}

impl Default for ZeroCrossMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ZeroCrossMonitor {
    /// Create a monitor with the standard loss window
    pub const fn new() -> Self {
        Self {
            status: Shared::new(ZeroCrossStatus::INITIAL),
            window: ms_to_ticks(ZERO_CROSS_LOSS_MS),
        }
    }

    /// Record a crossing (zero-crossing interrupt)
    pub fn on_edge(&self, cs: CriticalSection<'_>, polarity: Polarity, now: Tick) {
        self.status.set(
            cs,
            ZeroCrossStatus {
                detected: true,
                polarity,
                last_seen: now,
                lost: false,
            },
        );
    }

    /// Forget any earlier crossing so the next poll waits for a fresh one
    pub fn arm(&self, cs: CriticalSection<'_>) {
        self.status.update(cs, |mut s| {
            s.detected = false;
            s
        });
    }

    /// Non-blocking wait for a crossing requested at `since`
    pub fn poll_crossing(&self, cs: CriticalSection<'_>, since: Tick, now: Tick) -> CrossingPoll {
        let mut status = self.status.get(cs);

        if status.detected {
            status.detected = false;
            self.status.set(cs, status);
            return CrossingPoll::Detected;
        }

        if expired(now, since, self.window) {
            status.lost = true;
            self.status.set(cs, status);
            return CrossingPoll::TimedOut;
        }

        CrossingPoll::Pending
    }

    /// Declare the mains lost if it has been silent for too long
    ///
    /// Returns true only on the call that sets `lost`.
    pub fn check_silence(&self, cs: CriticalSection<'_>, now: Tick) -> bool {
        let mut status = self.status.get(cs);
        if status.lost || !expired(now, status.last_seen, self.window) {
            return false;
        }
        status.lost = true;
        self.status.set(cs, status);
        true
    }

    /// Whether the mains is currently considered lost
    pub fn is_lost(&self, cs: CriticalSection<'_>) -> bool {
        self.status.get(cs).lost
    }

    /// Current status snapshot
    pub fn status(&self, cs: CriticalSection<'_>) -> ZeroCrossStatus {
        self.status.get(cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_records_status() {
        let zc = ZeroCrossMonitor::new();
        critical_section::with(|cs| {
            zc.on_edge(cs, Polarity::High, 42);
            let status = zc.status(cs);
            assert!(status.detected);
            assert_eq!(status.polarity, Polarity::High);
            assert_eq!(status.last_seen, 42);
            assert!(!status.lost);
        });
    }

    #[test]
    fn test_poll_consumes_detection() {
        let zc = ZeroCrossMonitor::new();
        critical_section::with(|cs| {
            zc.arm(cs);
            assert_eq!(zc.poll_crossing(cs, 10, 11), CrossingPoll::Pending);
            zc.on_edge(cs, Polarity::Low, 12);
            assert_eq!(zc.poll_crossing(cs, 10, 12), CrossingPoll::Detected);
            assert!(!zc.status(cs).detected);
            assert_eq!(zc.poll_crossing(cs, 10, 13), CrossingPoll::Pending);
        });
    }

    #[test]
    fn test_arm_discards_stale_crossing() {
        let zc = ZeroCrossMonitor::new();
        critical_section::with(|cs| {
            zc.on_edge(cs, Polarity::Low, 5);
            zc.arm(cs);
            assert_eq!(zc.poll_crossing(cs, 6, 7), CrossingPoll::Pending);
        });
    }

    #[test]
    fn test_poll_times_out_and_sets_lost() {
        let zc = ZeroCrossMonitor::new();
        critical_section::with(|cs| {
            // 100 ms window = 10 ticks, strictly exceeded at 11
            assert_eq!(zc.poll_crossing(cs, 100, 110), CrossingPoll::Pending);
            assert_eq!(zc.poll_crossing(cs, 100, 111), CrossingPoll::TimedOut);
            assert!(zc.is_lost(cs));

            zc.on_edge(cs, Polarity::High, 120);
            assert!(!zc.is_lost(cs));
        });
    }

    #[test]
    fn test_silence_detected_once() {
        let zc = ZeroCrossMonitor::new();
        critical_section::with(|cs| {
            zc.on_edge(cs, Polarity::Low, 1000);
            assert!(!zc.check_silence(cs, 1010));
            assert!(zc.check_silence(cs, 1011));
            assert!(!zc.check_silence(cs, 1012));
            assert!(zc.is_lost(cs));
        });
    }

    #[test]
    fn test_silence_across_wrap() {
        let zc = ZeroCrossMonitor::new();
        critical_section::with(|cs| {
            zc.on_edge(cs, Polarity::Low, u32::MAX - 3);
            assert!(!zc.check_silence(cs, 5));
            assert!(zc.check_silence(cs, 8));
        });
    }
}
