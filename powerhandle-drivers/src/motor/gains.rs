//! Gain schedule
//!
//! PID gains, filter size and error deadband are interpolated from a
//! per-supply table keyed by output shaft RPM. Requests outside the table
//! use the nearest end entry.

use powerhandle_core::traits::SupplyVoltage;

use super::filter::{rpm_resolution, MAX_TAPS};

/// One table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPoint {
    pub shaft_rpm: f32,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Velocity filter size
    pub taps: f32,
    /// Armature RPM error below which no correction is applied
    pub min_rpm_error: f32,
}

const fn point(shaft_rpm: f32, kp: f32, ki: f32, kd: f32, taps: f32, min_rpm_error: f32) -> GainPoint {
    GainPoint {
        shaft_rpm,
        kp,
        ki,
        kd,
        taps,
        min_rpm_error,
    }
}

pub const GAINS_12V: [GainPoint; 5] = [
    point(5.0, 1.20, 0.080, 0.30, 32.0, 20.0),
    point(15.0, 0.90, 0.060, 0.20, 24.0, 30.0),
    point(30.0, 0.60, 0.040, 0.15, 16.0, 40.0),
    point(60.0, 0.45, 0.030, 0.10, 12.0, 60.0),
    point(120.0, 0.30, 0.020, 0.05, 8.0, 100.0),
];

pub const GAINS_15V: [GainPoint; 5] = [
    point(5.0, 0.96, 0.064, 0.24, 32.0, 20.0),
    point(15.0, 0.72, 0.048, 0.16, 24.0, 30.0),
    point(30.0, 0.48, 0.032, 0.12, 16.0, 40.0),
    point(60.0, 0.36, 0.024, 0.08, 12.0, 60.0),
    point(120.0, 0.24, 0.016, 0.04, 8.0, 100.0),
];

/// Interpolated parameters for one speed
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GainSchedule {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub taps: usize,
    pub min_rpm_error: f32,
}

pub fn table(voltage: SupplyVoltage) -> &'static [GainPoint] {
    match voltage {
        SupplyVoltage::V12 => &GAINS_12V,
        SupplyVoltage::V15 => &GAINS_15V,
    }
}

/// Look up the schedule for `shaft_rpm` on `voltage`
pub fn schedule(voltage: SupplyVoltage, shaft_rpm: u32) -> GainSchedule {
    interpolate(table(voltage), shaft_rpm as f32)
}

/// Linear interpolation between the two rows bracketing `shaft_rpm`
///
/// `table` must be non-empty and sorted by ascending RPM.
pub fn interpolate(table: &[GainPoint], shaft_rpm: f32) -> GainSchedule {
    let (low, high, frac) = match table.iter().position(|p| p.shaft_rpm >= shaft_rpm) {
        None => {
            let last = table.len() - 1;
            (last, last, 0.0)
        }
        Some(0) => (0, 0, 0.0),
        Some(i) => {
            let (a, b) = (&table[i - 1], &table[i]);
            (i - 1, i, (shaft_rpm - a.shaft_rpm) / (b.shaft_rpm - a.shaft_rpm))
        }
    };

    let lerp = |f: fn(&GainPoint) -> f32| {
        let a = f(&table[low]);
        a + (f(&table[high]) - a) * frac
    };

    GainSchedule {
        kp: lerp(|p| p.kp),
        ki: lerp(|p| p.ki),
        kd: lerp(|p| p.kd),
        taps: (round_half_up(lerp(|p| p.taps)) as usize).clamp(1, MAX_TAPS),
        min_rpm_error: lerp(|p| p.min_rpm_error),
    }
}

/// Snap an armature speed to the nearest value the filter can represent
pub fn quantize_speed(armature_rpm: f32, taps: usize, ticks_per_rev: u32) -> f32 {
    let resolution = rpm_resolution(taps, ticks_per_rev);
    round_half_up(armature_rpm / resolution) as f32 * resolution
}

/// Round a non-negative value, halves going up
pub(crate) fn round_half_up(x: f32) -> u32 {
    if x <= 0.0 {
        0
    } else {
        (x + 0.5) as u32
    }
}
