//! Speed PID
//!
//! Runs on armature speed error in RPM and produces a PWM magnitude. The
//! integrator is clamped so that the integral term alone spans exactly the
//! output range: `[PID_INTEGRATOR_LOW / Ki, PID_INTEGRATOR_HIGH / Ki]`.

/// Integral term ceiling in output counts (100% PWM)
pub const PID_INTEGRATOR_HIGH: f32 = 1000.0;

/// Integral term floor in output counts
pub const PID_INTEGRATOR_LOW: f32 = 0.0;

/// PID state and gains
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pid {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Last error fed in
    pub error: f32,
    pub error_sum: f32,
    /// Previous error minus current error
    pub error_diff: f32,
    pub output_min: f32,
    pub output_max: f32,
    /// Errors smaller than this are treated as zero
    pub deadband: f32,
}

impl Pid {
    pub const fn new(output_max: f32) -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            error: 0.0,
            error_sum: 0.0,
            error_diff: 0.0,
            output_min: 0.0,
            output_max,
            deadband: 0.0,
        }
    }

    /// Replace the gains, keeping accumulated state
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32, deadband: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self.deadband = deadband;
        self.error_sum = self.clamp_integrator(self.error_sum);
    }

    /// Clear accumulated state
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.error_sum = 0.0;
        self.error_diff = 0.0;
    }

    pub fn integrator_high(&self) -> f32 {
        PID_INTEGRATOR_HIGH / self.ki
    }

    pub fn integrator_low(&self) -> f32 {
        PID_INTEGRATOR_LOW / self.ki
    }

    fn clamp_integrator(&self, sum: f32) -> f32 {
        if self.ki > 0.0 {
            sum.clamp(self.integrator_low(), self.integrator_high())
        } else {
            0.0
        }
    }

    /// Feed one error sample and return the clamped output
    pub fn update(&mut self, error: f32) -> f32 {
        let error = if abs(error) < self.deadband { 0.0 } else { error };

        self.error_diff = self.error - error;
        self.error = error;
        self.error_sum = self.clamp_integrator(self.error_sum + error);

        let output = self.kp * error + self.ki * self.error_sum + self.kd * self.error_diff;
        output.clamp(self.output_min, self.output_max)
    }
}

pub(crate) fn abs(x: f32) -> f32 {
    if x < 0.0 {
        -x
    } else {
        x
    }
}
