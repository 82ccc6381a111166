//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in spotweld-core on top of embedded-hal:
//!
//! - Switched GPIO outputs (weld gate, measurement relay, buzzer)
//! - Trigger inputs (contact sense, foot switch)
//! - Threshold DAC (MCP48x1)
//! - A board bundle wiring them to the weld core

#![no_std]
#![deny(unsafe_code)]

pub mod board;
pub mod dac;
pub mod input;
pub mod output;

pub use board::WeldBoard;
pub use input::GpioInput;
pub use output::GpioSwitch;
