//! Mains supervision

pub mod zero_cross;

pub use zero_cross::{CrossingPoll, Polarity, ZeroCrossMonitor, ZeroCrossStatus, ZERO_CROSS_LOSS_MS};
