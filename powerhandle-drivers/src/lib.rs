//! Motor drivers for the powered stapler handle
//!
//! This crate implements the servo loop on top of the power stage traits
//! defined in powerhandle-core:
//!
//! - Per-motor servo state machine (startup, running, stopping)
//! - Speed PID and gain scheduling
//! - Current-trip profiles and stop reasons
//! - Power stage fault handling

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod motor;
