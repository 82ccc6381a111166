//! Threshold DAC drivers

pub mod mcp48xx;

pub use mcp48xx::{Gain, Mcp48xx, Resolution};
