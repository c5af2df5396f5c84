//! Motor servo configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of motors on the handle
pub const MOTOR_COUNT: usize = 3;

/// Servo loop constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoConfig {
    /// Armature turns per output shaft turn
    pub gear_ratio: u32,
    /// Encoder ticks per armature revolution
    pub ticks_per_rev: u32,
    /// Moves shorter than this are ignored; arrival window
    pub position_tolerance: i32,
    /// Ticks spent in Stopping measuring stop distance
    pub stop_tracking_ticks: u16,
    /// Ticks after startup with no movement before a zero-RPM stop
    pub zero_rpm_window: u16,
    /// Ticks travelled against the commanded direction before stopping
    pub direction_error_limit: i32,
    /// Stop distance beyond which the move is flagged as overrun
    pub overrun_limit: i32,
    /// Largest PWM magnitude in output counts
    pub output_max: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            gear_ratio: 25,
            ticks_per_rev: 12,
            position_tolerance: 5,
            stop_tracking_ticks: 10,
            zero_rpm_window: 100,
            direction_error_limit: 50,
            overrun_limit: 20,
            output_max: 1000,
        }
    }
}

impl ServoConfig {
    /// Encoder ticks per output shaft turn
    pub fn ticks_per_shaft_rev(&self) -> u32 {
        self.ticks_per_rev * self.gear_ratio
    }
}
