//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and board-specific implementations.

pub mod motor;
pub mod onewire;
pub mod timer;

pub use motor::{HardwareError, MotorHardware, MotorSample, SupplyVoltage};
pub use onewire::OneWireTransport;
pub use timer::SweepTimer;
