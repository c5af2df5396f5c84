//! Per-motor servo
//!
//! One [`Servo`] per motor, stepped once per millisecond by the controller.
//! Requests from the application only set a flag; the tick consumes it.
//!
//! ```text
//! Idle ──Move──▶ Startup ──start delay──▶ Running
//!  ▲                │                        │
//!  │                └────stop condition──────┤
//!  │                                         ▼
//!  └──────────stop tracking done────────── Stopping
//! ```

use powerhandle_core::config::ServoConfig;
use powerhandle_core::traits::{MotorSample, SupplyVoltage};

use super::filter::VelocityFilter;
use super::gains::{quantize_speed, schedule};
use super::pid::Pid;
use super::status::{MotorError, MotorState, MoveOutcome, MoveReport, StopStatus};
use super::trip::{TripProfile, TripZone, ZoneId};

/// Long-term current average smoothing (samples)
const CURRENT_AVERAGE_SAMPLES: f32 = 32.0;

/// Parameters of one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveRequest {
    /// Absolute target in encoder ticks
    pub target_position: i32,
    /// Output shaft speed
    pub shaft_rpm: u32,
    /// Time spent in Startup before running checks apply
    pub start_delay_ms: u16,
    /// Move timeout (0 = none)
    pub timeout_ms: u32,
    /// Fixed current trip used when no profile is attached (0 = none)
    pub current_trip: u16,
    /// Hardware current limit to program (0 = leave unchanged)
    pub current_limit: u16,
    /// Restart the long-term current statistics
    pub init_current: bool,
    pub voltage: SupplyVoltage,
}

impl MoveRequest {
    pub fn new(target_position: i32, shaft_rpm: u32) -> Self {
        Self {
            target_position,
            shaft_rpm,
            start_delay_ms: 0,
            timeout_ms: 0,
            current_trip: 0,
            current_limit: 0,
            init_current: true,
            voltage: SupplyVoltage::V12,
        }
    }
}

/// What the controller must apply after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServoCommand {
    /// Signed PWM duty
    pub duty: i32,
    /// New hardware current limit, if one must be programmed
    pub current_limit: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    None,
    Move,
    Stop(StopStatus),
}

/// Long-term current statistics of a move
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentStats {
    /// Exponential average over roughly 32 ticks
    pub average: f32,
    /// Highest average seen
    pub peak: f32,
    /// Lowest average seen
    pub valley: f32,
    /// Highest raw sample
    pub max_sample: u16,
}

impl CurrentStats {
    const fn new() -> Self {
        Self {
            average: 0.0,
            peak: 0.0,
            valley: f32::MAX,
            max_sample: 0,
        }
    }

    fn update(&mut self, current: u16) {
        self.average += (current as f32 - self.average) / CURRENT_AVERAGE_SAMPLES;
        self.peak = self.peak.max(self.average);
        self.valley = self.valley.min(self.average);
        self.max_sample = self.max_sample.max(current);
    }
}

/// Servo state of one motor
#[derive(Debug, Clone)]
pub struct Servo {
    state: MotorState,
    request: Request,
    position: i32,

    start_position: i32,
    /// Position at the previous drive tick
    last_position: i32,
    target_position: i32,
    direction: i32,
    shaft_rpm: u32,
    target_speed: f32,
    start_delay_ms: u16,
    timeout_ms: u32,
    current_trip: u16,
    current_limit: u16,

    pid: Pid,
    filter: VelocityFilter,
    profile: Option<TripProfile>,
    current: CurrentStats,

    elapsed_ms: u32,
    still_ticks: u16,
    direction_error: i32,
    last_zone: Option<ZoneId>,

    stop_status: StopStatus,
    stop_position: i32,
    stop_ticks: u16,
    stop_elapsed_ms: u32,
    report: Option<MoveReport>,
}

impl Servo {
    pub fn new(config: &ServoConfig) -> Self {
        Self {
            state: MotorState::Idle,
            request: Request::None,
            position: 0,
            start_position: 0,
            last_position: 0,
            target_position: 0,
            direction: 1,
            shaft_rpm: 0,
            target_speed: 0.0,
            start_delay_ms: 0,
            timeout_ms: 0,
            current_trip: 0,
            current_limit: 0,
            pid: Pid::new(config.output_max as f32),
            filter: VelocityFilter::new(),
            profile: None,
            current: CurrentStats::new(),
            elapsed_ms: 0,
            still_ticks: 0,
            direction_error: 0,
            last_zone: None,
            stop_status: StopStatus::empty(),
            stop_position: 0,
            stop_ticks: 0,
            stop_elapsed_ms: 0,
            report: None,
        }
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    /// Last sampled encoder position
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Quantized armature speed target
    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn current_stats(&self) -> &CurrentStats {
        &self.current
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// Reasons accumulated by the current or last move
    pub fn stop_status(&self) -> StopStatus {
        self.stop_status
    }

    pub fn report(&self) -> Option<&MoveReport> {
        self.report.as_ref()
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    /// Idle with no move pending
    pub fn is_stopped(&self) -> bool {
        self.state == MotorState::Idle && self.request != Request::Move
    }

    pub fn outcome(&self) -> MoveOutcome {
        match (self.is_stopped(), self.report) {
            (false, _) => MoveOutcome::InProgress,
            (true, Some(report)) => MoveOutcome::Complete(report),
            (true, None) => MoveOutcome::Idle,
        }
    }

    /// Prepare a move and flag it for the next tick
    ///
    /// Moves shorter than the position tolerance are dropped silently.
    pub fn start(&mut self, request: &MoveRequest, config: &ServoConfig) -> Result<(), MotorError> {
        if !self.is_stopped() {
            return Err(MotorError::Error);
        }

        let displacement = request.target_position.wrapping_sub(self.position);
        if displacement.unsigned_abs() < config.position_tolerance.unsigned_abs() {
            debug!(
                "move to {} within tolerance of {}, ignored",
                request.target_position, self.position
            );
            return Ok(());
        }

        let gains = schedule(request.voltage, request.shaft_rpm);
        let target_speed = speed_target(request.shaft_rpm, gains.taps, config)?;

        self.start_position = self.position;
        self.last_position = self.position;
        self.target_position = request.target_position;
        self.direction = displacement.signum();
        self.start_delay_ms = request.start_delay_ms;
        self.timeout_ms = request.timeout_ms;
        self.current_trip = request.current_trip;
        self.current_limit = request.current_limit;

        self.pid.reset();
        self.pid.set_gains(gains.kp, gains.ki, gains.kd, gains.min_rpm_error);
        self.filter.set_taps(gains.taps);
        self.filter.reset(self.position);
        self.shaft_rpm = request.shaft_rpm;
        self.target_speed = target_speed;

        if request.init_current {
            self.current = CurrentStats::new();
        }

        self.direction_error = 0;
        self.still_ticks = 0;
        self.last_zone = None;
        self.elapsed_ms = 0;
        self.stop_status = StopStatus::empty();
        self.request = Request::Move;

        info!(
            "move {} -> {} at {} rpm",
            self.position, self.target_position, request.shaft_rpm
        );
        Ok(())
    }

    /// Change speed of a running move without resetting its state
    pub fn update_speed(
        &mut self,
        shaft_rpm: u32,
        voltage: SupplyVoltage,
        config: &ServoConfig,
    ) -> Result<(), MotorError> {
        if self.is_stopped() || self.state == MotorState::Stopping {
            return Err(MotorError::Error);
        }

        let target_speed = speed_target(shaft_rpm, self.filter.taps(), config)?;
        let gains = schedule(voltage, shaft_rpm);
        self.pid.set_gains(gains.kp, gains.ki, gains.kd, gains.min_rpm_error);
        self.shaft_rpm = shaft_rpm;
        self.target_speed = target_speed;
        debug!("speed now {} rpm", shaft_rpm);
        Ok(())
    }

    /// Attach or clear the current-trip profile; only while stopped
    pub fn set_profile(
        &mut self,
        zones: Option<&[TripZone]>,
        config: &ServoConfig,
    ) -> Result<(), MotorError> {
        if !self.is_stopped() {
            return Err(MotorError::Error);
        }
        self.profile = match zones {
            Some(zones) => Some(TripProfile::new(zones, config.ticks_per_shaft_rev())?),
            None => None,
        };
        Ok(())
    }

    /// Ask the next tick to stop the move
    pub fn request_stop(&mut self, reason: StopStatus) {
        match self.request {
            // A move that never started is simply withdrawn
            Request::Move if self.state == MotorState::Idle => self.request = Request::None,
            Request::Stop(pending) => self.request = Request::Stop(pending | reason),
            _ if self.state == MotorState::Idle => {}
            _ => self.request = Request::Stop(reason),
        }
    }

    /// Remove drive immediately (power stage fault)
    pub fn abort(&mut self, reason: StopStatus) {
        match self.state {
            MotorState::Startup | MotorState::Running => self.enter_stopping(reason),
            MotorState::Stopping => self.stop_status |= reason,
            MotorState::Idle => {
                if self.request == Request::Move {
                    self.request = Request::None;
                }
            }
        }
    }

    /// Run one servo period
    pub fn tick(&mut self, sample: MotorSample, config: &ServoConfig) -> ServoCommand {
        self.position = sample.position;

        match self.state {
            MotorState::Idle => {
                if self.request != Request::Move {
                    return ServoCommand::default();
                }
                self.request = Request::None;
                self.state = MotorState::Startup;
                let limit = (self.current_limit > 0).then_some(self.current_limit);
                let mut command = self.drive(sample, config);
                command.current_limit = limit;
                command
            }
            MotorState::Startup | MotorState::Running => self.drive(sample, config),
            MotorState::Stopping => {
                self.track_stop(config);
                ServoCommand::default()
            }
        }
    }

    fn drive(&mut self, sample: MotorSample, config: &ServoConfig) -> ServoCommand {
        self.elapsed_ms = self.elapsed_ms.saturating_add(1);
        let window = self.filter.push(sample.position);
        let step = sample.position.wrapping_sub(self.last_position);
        self.last_position = sample.position;
        self.current.update(sample.current);

        let stop = self.stop_conditions(sample, window, step, config);
        if !stop.is_empty() {
            self.enter_stopping(stop);
            return ServoCommand::default();
        }

        if self.state == MotorState::Startup && self.elapsed_ms >= self.start_delay_ms as u32 {
            self.state = MotorState::Running;
        }

        let measured = self.filter.rpm(window, config.ticks_per_rev) * self.direction as f32;
        let output = self.pid.update(self.target_speed - measured);
        ServoCommand {
            duty: output as i32 * self.direction,
            current_limit: None,
        }
    }

    fn stop_conditions(
        &mut self,
        sample: MotorSample,
        window: i32,
        step: i32,
        config: &ServoConfig,
    ) -> StopStatus {
        let mut stop = StopStatus::empty();

        if let Request::Stop(reason) = self.request {
            self.request = Request::None;
            stop |= reason;
        }

        let remaining = self.target_position.wrapping_sub(sample.position);
        if remaining.unsigned_abs() <= config.position_tolerance.unsigned_abs()
            || remaining.signum() == -self.direction
        {
            stop |= StopStatus::POSITION;
        }

        if self.timeout_ms > 0 && self.elapsed_ms >= self.timeout_ms {
            stop |= StopStatus::TIMEOUT;
        }

        stop |= self.check_current(sample);

        if self.state == MotorState::Running {
            let wrong_way = step.wrapping_mul(self.direction);
            if wrong_way < 0 {
                self.direction_error = self.direction_error.saturating_add(-wrong_way);
            }
            if self.direction_error >= config.direction_error_limit {
                stop |= StopStatus::WRONG_DIRECTION;
            }

            if window == 0 {
                self.still_ticks = self.still_ticks.saturating_add(1);
            } else {
                self.still_ticks = 0;
            }
            if self.still_ticks >= config.zero_rpm_window {
                stop |= StopStatus::ZERO_RPM;
            }
        }

        stop
    }

    fn check_current(&mut self, sample: MotorSample) -> StopStatus {
        let travelled = sample
            .position
            .wrapping_sub(self.start_position)
            .wrapping_mul(self.direction);
        let current = sample.current as f32;

        match &self.profile {
            Some(profile) => match profile.evaluate(travelled, self.current.peak) {
                Some(eval) => {
                    self.last_zone = Some(eval.zone);
                    if current > eval.limit {
                        if eval.zone == ZoneId::EndStop {
                            StopStatus::CURRENT_ES
                        } else {
                            StopStatus::CURRENT_TRIP
                        }
                    } else {
                        StopStatus::empty()
                    }
                }
                None => StopStatus::empty(),
            },
            None if self.current_trip > 0 && sample.current > self.current_trip => {
                StopStatus::CURRENT_TRIP
            }
            None => StopStatus::empty(),
        }
    }

    fn enter_stopping(&mut self, reason: StopStatus) {
        self.stop_status |= reason;
        self.stop_position = self.position;
        self.stop_ticks = 0;
        self.stop_elapsed_ms = self.elapsed_ms;
        self.state = MotorState::Stopping;
        debug!(
            "stopping at {} after {} ms: {:?}",
            self.position, self.elapsed_ms, self.stop_status
        );
    }

    fn track_stop(&mut self, config: &ServoConfig) {
        self.stop_ticks = self.stop_ticks.saturating_add(1);
        if self.stop_ticks < config.stop_tracking_ticks {
            return;
        }

        let stop_distance = self.position.wrapping_sub(self.stop_position).wrapping_abs();
        if stop_distance > config.overrun_limit {
            self.stop_status |= StopStatus::OVERRUN;
        }

        let report = MoveReport {
            stop_status: self.stop_status,
            elapsed_ms: self.stop_elapsed_ms,
            stop_distance,
            final_position: self.position,
            peak_current: self.current.max_sample,
            last_zone: self.last_zone,
        };
        info!(
            "move done at {} ({:?}, stop distance {})",
            self.position, report.stop_status, stop_distance
        );

        self.report = Some(report);
        // Profiles apply to a single move
        self.profile = None;
        self.state = MotorState::Idle;
    }
}

/// Quantized armature speed for `shaft_rpm`
///
/// Speeds that overflow or quantize to zero cannot be driven.
fn speed_target(shaft_rpm: u32, taps: usize, config: &ServoConfig) -> Result<f32, MotorError> {
    let armature_rpm = shaft_rpm
        .checked_mul(config.gear_ratio)
        .ok_or(MotorError::InvalidParam)?;
    let target = quantize_speed(armature_rpm as f32, taps, config.ticks_per_rev);
    if target > 0.0 {
        Ok(target)
    } else {
        Err(MotorError::InvalidParam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServoConfig {
        ServoConfig::default()
    }

    fn sample(position: i32, current: u16) -> MotorSample {
        MotorSample { position, current }
    }

    /// Start a move from 0 and run the first tick
    fn running(request: MoveRequest) -> Servo {
        let mut servo = Servo::new(&config());
        servo.start(&request, &config()).unwrap();
        servo.tick(sample(0, 0), &config());
        servo
    }

    fn run_stop_tracking(servo: &mut Servo, position: i32) {
        for _ in 0..config().stop_tracking_ticks {
            servo.tick(sample(position, 0), &config());
        }
    }

    #[test]
    fn test_short_move_is_noop() {
        let mut servo = Servo::new(&config());
        servo.tick(sample(100, 0), &config());
        let pid_before = *servo.pid();

        assert_eq!(servo.start(&MoveRequest::new(104, 30), &config()), Ok(()));
        assert_eq!(servo.start(&MoveRequest::new(96, 30), &config()), Ok(()));

        assert_eq!(servo.state(), MotorState::Idle);
        assert!(servo.is_stopped());
        assert_eq!(*servo.pid(), pid_before);
        assert_eq!(servo.stop_status(), StopStatus::empty());
        assert_eq!(servo.tick(sample(100, 0), &config()), ServoCommand::default());
        assert_eq!(servo.outcome(), MoveOutcome::Idle);
    }

    #[test]
    fn test_start_schedules_gains_and_speed() {
        let mut servo = Servo::new(&config());
        servo.start(&MoveRequest::new(1000, 30), &config()).unwrap();

        // 30 rpm × 25 = 750 armature rpm, 16 taps → 312.5 rpm steps
        assert_eq!(servo.target_speed(), 625.0);
        assert!(!servo.is_stopped());
        assert_eq!(servo.outcome(), MoveOutcome::InProgress);
        assert_eq!(servo.start(&MoveRequest::new(2000, 30), &config()), Err(MotorError::Error));
    }

    #[test]
    fn test_first_tick_programs_current_limit() {
        let mut servo = Servo::new(&config());
        let request = MoveRequest {
            current_limit: 1800,
            ..MoveRequest::new(1000, 30)
        };
        servo.start(&request, &config()).unwrap();

        let command = servo.tick(sample(0, 0), &config());
        assert_eq!(command.current_limit, Some(1800));
        assert!(command.duty > 0);
        assert_eq!(servo.tick(sample(1, 0), &config()).current_limit, None);
    }

    #[test]
    fn test_reverse_move_drives_negative() {
        let servo_cmd = {
            let mut servo = Servo::new(&config());
            servo.start(&MoveRequest::new(-1000, 60), &config()).unwrap();
            servo.tick(sample(0, 0), &config())
        };
        assert!(servo_cmd.duty < 0);
    }

    #[test]
    fn test_position_reached() {
        let mut servo = running(MoveRequest::new(1000, 30));
        servo.tick(sample(996, 0), &config());

        assert_eq!(servo.state(), MotorState::Stopping);
        assert!(servo.stop_status().contains(StopStatus::POSITION));

        run_stop_tracking(&mut servo, 1002);
        assert!(servo.is_stopped());
        let report = servo.report().unwrap();
        assert_eq!(report.stop_distance, 6);
        assert_eq!(report.final_position, 1002);
        assert!(!report.overrun());
    }

    #[test]
    fn test_overrun_flagged() {
        let mut servo = running(MoveRequest::new(1000, 30));
        servo.tick(sample(1000, 0), &config());
        run_stop_tracking(&mut servo, 1040);

        let report = servo.report().unwrap();
        assert!(report.overrun());
        assert!(report.stop_status.contains(StopStatus::POSITION | StopStatus::OVERRUN));
    }

    #[test]
    fn test_timeout() {
        let request = MoveRequest {
            timeout_ms: 3,
            ..MoveRequest::new(1000, 30)
        };
        let mut servo = running(request);
        servo.tick(sample(1, 0), &config());
        assert_eq!(servo.state(), MotorState::Running);
        servo.tick(sample(2, 0), &config());
        assert_eq!(servo.state(), MotorState::Stopping);
        assert_eq!(servo.stop_status(), StopStatus::TIMEOUT);
    }

    #[test]
    fn test_stop_request_consumed_on_tick() {
        let mut servo = running(MoveRequest::new(1000, 30));
        servo.request_stop(StopStatus::REQUEST);
        assert_eq!(servo.state(), MotorState::Running);

        servo.tick(sample(5, 0), &config());
        assert_eq!(servo.state(), MotorState::Stopping);
        assert_eq!(servo.stop_status(), StopStatus::REQUEST);
    }

    #[test]
    fn test_stop_before_first_tick_withdraws_move() {
        let mut servo = Servo::new(&config());
        servo.start(&MoveRequest::new(1000, 30), &config()).unwrap();
        servo.request_stop(StopStatus::REQUEST);
        assert!(servo.is_stopped());
        assert_eq!(servo.tick(sample(0, 0), &config()), ServoCommand::default());
        assert_eq!(servo.state(), MotorState::Idle);
    }

    #[test]
    fn test_fixed_current_trip_without_profile() {
        let request = MoveRequest {
            current_trip: 800,
            ..MoveRequest::new(1000, 30)
        };
        let mut servo = running(request);
        servo.tick(sample(3, 800), &config());
        assert_eq!(servo.state(), MotorState::Running);
        servo.tick(sample(6, 801), &config());
        assert_eq!(servo.stop_status(), StopStatus::CURRENT_TRIP);
    }

    #[test]
    fn test_end_stop_zone_sets_current_es() {
        let mut servo = Servo::new(&config());
        servo
            .set_profile(Some(&[TripZone::absolute(10.0, 300, ZoneId::EndStop)]), &config())
            .unwrap();
        servo.start(&MoveRequest::new(1000, 30), &config()).unwrap();
        servo.tick(sample(0, 0), &config());
        servo.tick(sample(10, 350), &config());

        assert_eq!(servo.stop_status(), StopStatus::CURRENT_ES);
        run_stop_tracking(&mut servo, 10);
        assert_eq!(servo.report().unwrap().last_zone, Some(ZoneId::EndStop));
        assert!(!servo.has_profile());
    }

    #[test]
    fn test_current_stats_track_samples() {
        let mut servo = running(MoveRequest::new(1000, 30));
        servo.tick(sample(2, 320), &config());
        servo.tick(sample(4, 64), &config());

        let stats = servo.current_stats();
        assert_eq!(stats.max_sample, 320);
        assert!(stats.peak >= stats.average);
        assert_eq!(stats.valley, 0.0);
    }

    #[test]
    fn test_profile_locked_while_moving() {
        let mut servo = running(MoveRequest::new(1000, 30));
        assert_eq!(servo.set_profile(None, &config()), Err(MotorError::Error));
    }

    #[test]
    fn test_wrong_direction() {
        let mut servo = running(MoveRequest::new(1000, 30));
        servo.tick(sample(-20, 0), &config());
        assert_eq!(servo.state(), MotorState::Running);
        servo.tick(sample(-60, 0), &config());
        assert!(servo.stop_status().contains(StopStatus::WRONG_DIRECTION));
    }

    #[test]
    fn test_zero_rpm_after_window() {
        let mut servo = running(MoveRequest::new(1000, 30));
        for _ in 1..config().zero_rpm_window {
            servo.tick(sample(0, 0), &config());
            assert_eq!(servo.state(), MotorState::Running);
        }
        servo.tick(sample(0, 0), &config());
        assert_eq!(servo.stop_status(), StopStatus::ZERO_RPM);
    }

    #[test]
    fn test_start_delay_suppresses_running_checks() {
        let request = MoveRequest {
            start_delay_ms: 50,
            ..MoveRequest::new(1000, 30)
        };
        let mut servo = running(request);
        servo.tick(sample(-100, 0), &config());
        assert_eq!(servo.state(), MotorState::Startup);
        assert_eq!(servo.stop_status(), StopStatus::empty());
    }

    #[test]
    fn test_update_speed_keeps_integrator() {
        let mut servo = running(MoveRequest::new(5000, 30));
        for _ in 0..19 {
            servo.tick(sample(0, 0), &config());
        }
        let sum = servo.pid().error_sum;
        assert!(sum > 0.0);

        servo.update_speed(60, SupplyVoltage::V12, &config()).unwrap();
        assert_eq!(servo.pid().error_sum, sum);
        // 60 rpm × 25 = 1500 armature rpm on the 16 tap filter
        assert_eq!(servo.target_speed(), 1562.5);
    }

    #[test]
    fn test_rejects_speeds_that_cannot_be_driven() {
        let mut servo = Servo::new(&config());
        // 3 rpm × 25 = 75 armature rpm, below one 156.25 rpm step at 32 taps
        assert_eq!(
            servo.start(&MoveRequest::new(1000, 3), &config()),
            Err(MotorError::InvalidParam)
        );
        assert_eq!(
            servo.start(&MoveRequest::new(1000, 0), &config()),
            Err(MotorError::InvalidParam)
        );
        assert_eq!(
            servo.start(&MoveRequest::new(1000, u32::MAX / 10), &config()),
            Err(MotorError::InvalidParam)
        );
        assert!(servo.is_stopped());
        assert_eq!(servo.tick(sample(0, 0), &config()), ServoCommand::default());
        assert_eq!(servo.outcome(), MoveOutcome::Idle);
    }

    #[test]
    fn test_update_speed_rejects_undrivable_speed() {
        let mut servo = running(MoveRequest::new(5000, 30));
        let target = servo.target_speed();

        assert_eq!(
            servo.update_speed(0, SupplyVoltage::V12, &config()),
            Err(MotorError::InvalidParam)
        );
        assert_eq!(
            servo.update_speed(u32::MAX, SupplyVoltage::V12, &config()),
            Err(MotorError::InvalidParam)
        );
        assert_eq!(servo.target_speed(), target);
        assert_eq!(servo.state(), MotorState::Running);
    }

    #[test]
    fn test_slow_reverse_drift_counts_each_tick_once() {
        let mut servo = running(MoveRequest::new(1000, 30));
        let limit = config().direction_error_limit;

        for position in 1..limit {
            servo.tick(sample(-position, 0), &config());
            assert_eq!(servo.state(), MotorState::Running, "stopped at {}", position);
        }
        servo.tick(sample(-limit, 0), &config());
        assert_eq!(servo.stop_status(), StopStatus::WRONG_DIRECTION);
    }

    #[test]
    fn test_update_speed_requires_move() {
        let mut servo = Servo::new(&config());
        assert_eq!(
            servo.update_speed(60, SupplyVoltage::V12, &config()),
            Err(MotorError::Error)
        );
    }
}
