//! Motor controller
//!
//! Owns one [`Servo`] per motor and the power stage. The application calls
//! the request methods from its own context; [`MotorController::tick`] runs
//! every servo once per millisecond.
//!
//! A power stage error stops every motor. The FPGA is reloaded once all
//! motors have finished their stop tracking, and new moves are refused
//! until then.

use powerhandle_core::config::{ServoConfig, MOTOR_COUNT};
use powerhandle_core::traits::{MotorHardware, MotorSample, SupplyVoltage};

use super::servo::{MoveRequest, Servo, ServoCommand};
use super::status::{MotorError, MoveOutcome, MoveReport, StopStatus};
use super::trip::TripZone;

pub struct MotorController {
    config: ServoConfig,
    servos: [Servo; MOTOR_COUNT],
    samples: [MotorSample; MOTOR_COUNT],
    refresh_pending: bool,
}

impl MotorController {
    pub fn new(config: ServoConfig) -> Self {
        Self {
            servos: core::array::from_fn(|_| Servo::new(&config)),
            samples: [MotorSample::default(); MOTOR_COUNT],
            config,
            refresh_pending: false,
        }
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Waiting for the FPGA reload after a power stage fault
    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn servo(&self, motor: u8) -> Result<&Servo, MotorError> {
        self.servos
            .get(motor as usize)
            .ok_or(MotorError::InvalidParam)
    }

    fn servo_mut(&mut self, motor: u8) -> Result<&mut Servo, MotorError> {
        self.servos
            .get_mut(motor as usize)
            .ok_or(MotorError::InvalidParam)
    }

    /// Begin a move on `motor`
    pub fn start(&mut self, motor: u8, request: &MoveRequest) -> Result<(), MotorError> {
        if self.refresh_pending {
            return Err(MotorError::Fault);
        }
        let config = self.config;
        self.servo_mut(motor)?.start(request, &config)
    }

    /// Stop `motor` on caller request
    pub fn stop(&mut self, motor: u8) -> Result<(), MotorError> {
        self.stop_with(motor, StopStatus::REQUEST)
    }

    /// Stop `motor` for an application-detected reason
    pub fn stop_with(&mut self, motor: u8, reason: StopStatus) -> Result<(), MotorError> {
        if reason.is_empty() || !StopStatus::external().contains(reason) {
            return Err(MotorError::InvalidParam);
        }
        self.servo_mut(motor)?.request_stop(reason);
        Ok(())
    }

    pub fn position(&self, motor: u8) -> Result<i32, MotorError> {
        self.servo(motor).map(Servo::position)
    }

    /// Idle with no move pending; unknown motors count as stopped
    pub fn is_stopped(&self, motor: u8) -> bool {
        self.servo(motor).map_or(true, Servo::is_stopped)
    }

    /// Attach a current-trip profile for the next move, or clear it
    pub fn set_current_trip_profile(
        &mut self,
        motor: u8,
        zones: Option<&[TripZone]>,
    ) -> Result<(), MotorError> {
        let config = self.config;
        self.servo_mut(motor)?.set_profile(zones, &config)
    }

    pub fn update_speed(
        &mut self,
        motor: u8,
        shaft_rpm: u32,
        voltage: SupplyVoltage,
    ) -> Result<(), MotorError> {
        let config = self.config;
        self.servo_mut(motor)?.update_speed(shaft_rpm, voltage, &config)
    }

    pub fn outcome(&self, motor: u8) -> Result<MoveOutcome, MotorError> {
        self.servo(motor).map(Servo::outcome)
    }

    pub fn report(&self, motor: u8) -> Result<Option<MoveReport>, MotorError> {
        self.servo(motor).map(|servo| servo.report().copied())
    }

    /// Run one servo period on every motor
    pub fn tick<H: MotorHardware>(&mut self, hw: &mut H) {
        let mut fault = false;

        for (index, servo) in self.servos.iter_mut().enumerate() {
            let motor = index as u8;
            match hw.sample(motor) {
                Ok(sample) => self.samples[index] = sample,
                Err(e) => {
                    error!("motor {} sample failed: {:?}", motor, e);
                    fault = true;
                }
            }

            let command = servo.tick(self.samples[index], &self.config);
            if !fault {
                fault = apply(hw, motor, command).is_err();
            }
        }

        if fault {
            self.power_stage_fault(hw);
        } else if self.refresh_pending && self.servos.iter().all(Servo::is_stopped) {
            match hw.refresh() {
                Ok(()) => {
                    info!("power stage reloaded");
                    self.refresh_pending = false;
                }
                Err(e) => warn!("power stage reload failed: {:?}", e),
            }
        }
    }

    fn power_stage_fault<H: MotorHardware>(&mut self, hw: &mut H) {
        hw.stop_all();
        if !self.refresh_pending {
            error!("power stage fault, stopping all motors");
        }
        for servo in self.servos.iter_mut() {
            servo.abort(StopStatus::FPGA_COMM);
        }
        self.refresh_pending = true;
    }
}

fn apply<H: MotorHardware>(
    hw: &mut H,
    motor: u8,
    command: ServoCommand,
) -> Result<(), powerhandle_core::traits::HardwareError> {
    if let Some(limit) = command.current_limit {
        hw.set_current_limit(motor, limit)?;
    }
    hw.set_output(motor, command.duty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::trip::ZoneId;
    use crate::motor::MotorState;
    use powerhandle_core::traits::HardwareError;

    #[derive(Default)]
    struct MockHardware {
        samples: [MotorSample; MOTOR_COUNT],
        duty: [i32; MOTOR_COUNT],
        limits: [Option<u16>; MOTOR_COUNT],
        fail_sample: Option<u8>,
        fail_output: Option<u8>,
        stop_all_calls: u32,
        refresh_calls: u32,
    }

    impl MockHardware {
        fn at(&mut self, motor: usize, position: i32, current: u16) {
            self.samples[motor] = MotorSample { position, current };
        }
    }

    impl MotorHardware for MockHardware {
        fn sample(&mut self, motor: u8) -> Result<MotorSample, HardwareError> {
            if self.fail_sample == Some(motor) {
                return Err(HardwareError::FpgaComm);
            }
            Ok(self.samples[motor as usize])
        }

        fn set_output(&mut self, motor: u8, duty: i32) -> Result<(), HardwareError> {
            if self.fail_output == Some(motor) {
                return Err(HardwareError::FpgaComm);
            }
            self.duty[motor as usize] = duty;
            Ok(())
        }

        fn set_current_limit(&mut self, motor: u8, limit: u16) -> Result<(), HardwareError> {
            self.limits[motor as usize] = Some(limit);
            Ok(())
        }

        fn stop_all(&mut self) {
            self.stop_all_calls += 1;
            self.duty = [0; MOTOR_COUNT];
        }

        fn refresh(&mut self) -> Result<(), HardwareError> {
            self.refresh_calls += 1;
            Ok(())
        }
    }

    fn controller() -> MotorController {
        MotorController::new(ServoConfig::default())
    }

    #[test]
    fn test_move_shorter_than_tolerance_is_ignored() {
        let mut motors = controller();
        let mut hw = MockHardware::default();
        hw.at(1, 500, 0);
        motors.tick(&mut hw);

        assert_eq!(motors.start(1, &MoveRequest::new(503, 30)), Ok(()));
        assert!(motors.is_stopped(1));
        motors.tick(&mut hw);
        assert_eq!(hw.duty[1], 0);
        assert_eq!(motors.outcome(1), Ok(MoveOutcome::Idle));
    }

    #[test]
    fn test_profile_current_trip_stops_motor() {
        let mut motors = controller();
        let mut hw = MockHardware::default();
        let profile = [
            TripZone::absolute(200.0 / 300.0, 500, ZoneId::Learning),
            TripZone::delta(10.0, 150, 1.5, ZoneId::Normal),
        ];
        motors.set_current_trip_profile(0, Some(&profile)).unwrap();
        motors.start(0, &MoveRequest::new(1000, 30)).unwrap();

        motors.tick(&mut hw);
        assert!(hw.duty[0] > 0);
        assert_eq!(motors.servo(0).unwrap().state(), MotorState::Running);

        hw.at(0, 150, 600);
        motors.tick(&mut hw);
        let servo = motors.servo(0).unwrap();
        assert_eq!(servo.state(), MotorState::Stopping);
        assert!(servo.stop_status().is_current_trip());
        assert_eq!(hw.duty[0], 0);

        for _ in 0..ServoConfig::default().stop_tracking_ticks {
            motors.tick(&mut hw);
        }
        let report = motors.report(0).unwrap().unwrap();
        assert_eq!(report.stop_status, StopStatus::CURRENT_TRIP);
        assert_eq!(report.last_zone, Some(ZoneId::Learning));
        assert_eq!(report.final_position, 150);
        assert!(motors.is_stopped(0));
    }

    #[test]
    fn test_position_reached_and_reported() {
        let mut motors = controller();
        let mut hw = MockHardware::default();
        let request = MoveRequest {
            current_limit: 1500,
            ..MoveRequest::new(600, 60)
        };
        motors.start(2, &request).unwrap();
        motors.tick(&mut hw);
        assert_eq!(hw.limits[2], Some(1500));

        hw.at(2, 598, 0);
        motors.tick(&mut hw);
        assert!(!motors.is_stopped(2));
        assert_eq!(motors.outcome(2), Ok(MoveOutcome::InProgress));

        hw.at(2, 601, 0);
        for _ in 0..ServoConfig::default().stop_tracking_ticks {
            motors.tick(&mut hw);
        }
        assert_eq!(motors.position(2), Ok(601));
        match motors.outcome(2) {
            Ok(MoveOutcome::Complete(report)) => {
                assert_eq!(report.stop_status, StopStatus::POSITION);
                assert_eq!(report.stop_distance, 3);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_stop_request() {
        let mut motors = controller();
        let mut hw = MockHardware::default();
        motors.start(0, &MoveRequest::new(1000, 30)).unwrap();
        motors.tick(&mut hw);

        motors.stop_with(0, StopStatus::OBSTRUCTION).unwrap();
        hw.at(0, 4, 0);
        motors.tick(&mut hw);
        assert_eq!(motors.servo(0).unwrap().stop_status(), StopStatus::OBSTRUCTION);
    }

    #[test]
    fn test_stop_reason_must_be_external() {
        let mut motors = controller();
        assert_eq!(motors.stop_with(0, StopStatus::POSITION), Err(MotorError::InvalidParam));
        assert_eq!(motors.stop_with(0, StopStatus::empty()), Err(MotorError::InvalidParam));
        assert_eq!(motors.stop(0), Ok(()));
    }

    #[test]
    fn test_invalid_motor_id() {
        let mut motors = controller();
        let id = MOTOR_COUNT as u8;
        assert_eq!(motors.start(id, &MoveRequest::new(1000, 30)), Err(MotorError::InvalidParam));
        assert_eq!(motors.stop(id), Err(MotorError::InvalidParam));
        assert_eq!(motors.position(id), Err(MotorError::InvalidParam));
        assert_eq!(
            motors.update_speed(id, 30, SupplyVoltage::V12),
            Err(MotorError::InvalidParam)
        );
        assert!(motors.is_stopped(id));
    }

    #[test]
    fn test_power_stage_fault_stops_all_and_reloads() {
        let mut motors = controller();
        let mut hw = MockHardware::default();
        motors.start(0, &MoveRequest::new(1000, 30)).unwrap();
        motors.start(1, &MoveRequest::new(-1000, 30)).unwrap();
        motors.tick(&mut hw);

        hw.fail_sample = Some(1);
        motors.tick(&mut hw);
        assert_eq!(hw.stop_all_calls, 1);
        assert!(motors.refresh_pending());
        for motor in 0..2 {
            let servo = motors.servo(motor).unwrap();
            assert_eq!(servo.state(), MotorState::Stopping);
            assert!(servo.stop_status().contains(StopStatus::FPGA_COMM));
        }
        assert_eq!(motors.start(2, &MoveRequest::new(1000, 30)), Err(MotorError::Fault));

        hw.fail_sample = None;
        for _ in 0..ServoConfig::default().stop_tracking_ticks {
            motors.tick(&mut hw);
        }
        assert_eq!(hw.refresh_calls, 1);
        assert!(!motors.refresh_pending());
        assert!(motors.is_stopped(0));
        assert_eq!(motors.start(2, &MoveRequest::new(1000, 30)), Ok(()));
    }

    #[test]
    fn test_output_failure_stops_all_motors() {
        let mut motors = controller();
        let mut hw = MockHardware::default();
        motors.start(0, &MoveRequest::new(1000, 30)).unwrap();
        motors.start(2, &MoveRequest::new(-1000, 30)).unwrap();
        motors.tick(&mut hw);

        hw.fail_output = Some(0);
        hw.at(0, 3, 0);
        hw.at(2, -3, 0);
        motors.tick(&mut hw);

        assert_eq!(hw.stop_all_calls, 1);
        assert!(motors.refresh_pending());
        for motor in [0, 2] {
            let servo = motors.servo(motor).unwrap();
            assert_eq!(servo.state(), MotorState::Stopping);
            assert_eq!(servo.stop_status(), StopStatus::FPGA_COMM);
        }
        assert_eq!(hw.duty, [0; MOTOR_COUNT]);
        assert_eq!(motors.start(1, &MoveRequest::new(1000, 30)), Err(MotorError::Fault));
    }
}
