//! Board-agnostic weld control core for the spot welder firmware
//!
//! This crate contains all weld control logic that does not depend on
//! specific hardware implementations:
//!
//! - System and weld time bases
//! - AC zero-crossing monitor
//! - Trigger arbitration (contact sense or foot switch)
//! - Weld cycle state machine (single, double pulse and continuous)
//! - Safety gate (configuration validation, emergency halt, AC loss)
//! - Hardware and UI collaborator traits
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod mains;
pub mod safety;
pub mod state;
pub mod sync;
pub mod timing;
pub mod traits;
pub mod trigger;
pub mod weld;
pub mod welder;

pub use welder::Welder;
