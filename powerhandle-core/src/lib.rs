//! Board-agnostic core logic for the powered stapler handle firmware
//!
//! This crate contains the application logic that does not depend on a
//! specific board or bus master:
//!
//! - One-wire transport contract and error taxonomy
//! - EEPROM codec for the 64-byte accessory memory records
//! - Typed memory layouts and per-class adapters
//! - Device manager state machine (discovery, authentication, faults)
//! - Security log records
//! - Hardware abstraction traits for the motor servo
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod crc;
pub mod device;
pub mod eeprom;
pub mod onewire;
pub mod security;
pub mod traits;

#[cfg(test)]
mod testing;
