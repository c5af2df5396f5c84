//! Motor power stage traits
//!
//! The handle drives its motors through an FPGA that counts encoder edges,
//! samples phase current and generates PWM. The servo loop only sees it
//! through [`MotorHardware`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supply voltage selecting the gain schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SupplyVoltage {
    /// 12 V battery rail
    #[default]
    V12,
    /// 15 V battery rail
    V15,
}

/// Errors reported by the power stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// FPGA register access failed or returned inconsistent data
    FpgaComm,
}

/// One servo-tick snapshot of a motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorSample {
    /// Accumulated encoder position in ticks
    pub position: i32,
    /// Phase current in ADC counts
    pub current: u16,
}

/// Power stage for all motors
///
/// Motor ids are validated by the caller; implementations may assume
/// `motor < MOTOR_COUNT`.
pub trait MotorHardware {
    /// Read position and current for `motor`
    fn sample(&mut self, motor: u8) -> Result<MotorSample, HardwareError>;

    /// Apply a signed PWM duty in output counts (sign selects direction)
    fn set_output(&mut self, motor: u8, duty: i32) -> Result<(), HardwareError>;

    /// Program the hardware current limit for `motor`
    fn set_current_limit(&mut self, motor: u8, limit: u16) -> Result<(), HardwareError>;

    /// Remove drive from every motor immediately
    fn stop_all(&mut self);

    /// Reload the FPGA configuration after a communication fault
    fn refresh(&mut self) -> Result<(), HardwareError>;
}
