//! Motor status types

use bitflags::bitflags;

use super::trip::ZoneId;

bitflags! {
    /// Reasons a move stopped; several may be set at once
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StopStatus: u16 {
        /// Target position reached
        const POSITION = 1 << 0;
        /// Move exceeded its timeout
        const TIMEOUT = 1 << 1;
        /// Stopped on caller request
        const REQUEST = 1 << 2;
        /// Current trip in an end-stop zone
        const CURRENT_ES = 1 << 3;
        /// Current trip in any other zone
        const CURRENT_TRIP = 1 << 4;
        /// No encoder movement while driving
        const ZERO_RPM = 1 << 5;
        /// Strain gauge force limit
        const STRAIN_GAUGE = 1 << 6;
        /// Obstruction detected by the application
        const OBSTRUCTION = 1 << 7;
        /// Target load reached
        const TARGET_LOAD = 1 << 8;
        /// Unrecoverable error
        const FATAL = 1 << 9;
        /// Stop distance exceeded the overrun limit
        const OVERRUN = 1 << 10;
        /// Motor moved against the commanded direction
        const WRONG_DIRECTION = 1 << 11;
        /// FPGA communication failed
        const FPGA_COMM = 1 << 12;
    }
}

impl StopStatus {
    /// Any current-trip reason
    pub fn is_current_trip(self) -> bool {
        self.intersects(StopStatus::CURRENT_ES | StopStatus::CURRENT_TRIP)
    }

    /// Reasons the application may raise through `stop_with`
    pub fn external() -> Self {
        StopStatus::REQUEST
            | StopStatus::STRAIN_GAUGE
            | StopStatus::OBSTRUCTION
            | StopStatus::TARGET_LOAD
            | StopStatus::FATAL
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StopStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "StopStatus({=u16:#x})", self.bits());
    }
}

/// Motor API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Motor is not in a state that accepts the request
    Error,
    /// Bad motor id or parameter
    InvalidParam,
    /// Power stage fault recovery in progress
    Fault,
}

/// Per-motor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    #[default]
    Idle,
    /// Driving, start-up checks suppressed
    Startup,
    Running,
    /// Drive removed, measuring stop distance
    Stopping,
}

/// Diagnostics of the last completed move
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    pub stop_status: StopStatus,
    /// Time from start to the stop decision
    pub elapsed_ms: u32,
    /// Ticks travelled after drive was removed
    pub stop_distance: i32,
    pub final_position: i32,
    /// Highest raw current sample
    pub peak_current: u16,
    /// Zone active when the move stopped
    pub last_zone: Option<ZoneId>,
}

impl MoveReport {
    pub fn overrun(&self) -> bool {
        self.stop_status.contains(StopStatus::OVERRUN)
    }
}

/// Progress of a motor as seen by the application
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveOutcome {
    /// No move has completed since power-up
    Idle,
    /// Move requested or under way
    InProgress,
    /// Last move finished
    Complete(MoveReport),
}
