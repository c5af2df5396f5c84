//! Motor servo control
//!
//! Closed-loop speed control with position targets for the handle motors:
//!
//! - Speed PID with a gain schedule per supply voltage
//! - Encoder velocity filter sized from the schedule
//! - Zoned current-trip profiles
//! - Stop detection and stop-distance tracking

pub mod controller;
pub mod filter;
pub mod gains;
pub mod pid;
pub mod servo;
pub mod status;
pub mod trip;

pub use controller::MotorController;
pub use filter::VelocityFilter;
pub use gains::{schedule, GainSchedule};
pub use pid::Pid;
pub use servo::{CurrentStats, MoveRequest, Servo, ServoCommand};
pub use status::{MotorError, MotorState, MoveOutcome, MoveReport, StopStatus};
pub use trip::{TripEval, TripMethod, TripProfile, TripZone, ZoneId, MAX_TRIP_ZONES};
