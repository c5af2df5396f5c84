//! Current-trip profiles
//!
//! A profile splits a move into zones by shaft turns travelled. Each zone
//! has its own trip level, either absolute or relative to the long-term
//! current peak. Turn thresholds are converted to encoder ticks when the
//! profile is attached, so the servo tick only compares integers.

use heapless::Vec;

use super::gains::round_half_up;
use super::status::MotorError;

/// Largest number of zones in a profile
pub const MAX_TRIP_ZONES: usize = 8;

/// How a zone's trip level is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TripMethod {
    /// Trip at the raw value
    Absolute,
    /// Trip at long-term peak + k × raw value
    Delta,
}

/// Purpose of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ZoneId {
    Learning,
    EndStop,
    Interlock,
    Normal,
    /// Placeholder row, never evaluated
    NotUsed,
}

/// One profile row as supplied by the application
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TripZone {
    /// Zone ends once this many shaft turns have been travelled
    pub turns_position: f32,
    /// Trip level in ADC counts (scaled by `k_coefficient` for Delta)
    pub trip_value: u16,
    pub method: TripMethod,
    pub zone: ZoneId,
    pub k_coefficient: f32,
}

impl TripZone {
    pub const fn absolute(turns_position: f32, trip_value: u16, zone: ZoneId) -> Self {
        Self {
            turns_position,
            trip_value,
            method: TripMethod::Absolute,
            zone,
            k_coefficient: 1.0,
        }
    }

    pub const fn delta(turns_position: f32, trip_value: u16, k_coefficient: f32, zone: ZoneId) -> Self {
        Self {
            turns_position,
            trip_value,
            method: TripMethod::Delta,
            zone,
            k_coefficient,
        }
    }

    /// Trip level for a given long-term current peak
    pub fn limit(&self, long_term_peak: f32) -> f32 {
        match self.method {
            TripMethod::Absolute => self.trip_value as f32,
            TripMethod::Delta => long_term_peak + self.k_coefficient * self.trip_value as f32,
        }
    }
}

/// Zone selected for the current position
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TripEval {
    pub zone: ZoneId,
    pub limit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArmedZone {
    zone: TripZone,
    threshold: i32,
}

/// Profile with thresholds in encoder ticks
#[derive(Debug, Clone, PartialEq)]
pub struct TripProfile {
    zones: Vec<ArmedZone, MAX_TRIP_ZONES>,
}

impl TripProfile {
    /// Attach `zones`, converting turns with `ticks_per_shaft_rev`
    ///
    /// Used zones must have ascending thresholds.
    pub fn new(zones: &[TripZone], ticks_per_shaft_rev: u32) -> Result<Self, MotorError> {
        let mut armed: Vec<ArmedZone, MAX_TRIP_ZONES> = Vec::new();
        let mut last = i32::MIN;

        for zone in zones {
            let threshold = round_half_up(zone.turns_position * ticks_per_shaft_rev as f32) as i32;
            if zone.zone != ZoneId::NotUsed {
                if threshold < last {
                    return Err(MotorError::InvalidParam);
                }
                last = threshold;
            }
            armed
                .push(ArmedZone {
                    zone: *zone,
                    threshold,
                })
                .map_err(|_| MotorError::InvalidParam)?;
        }

        Ok(Self { zones: armed })
    }

    /// Threshold in ticks of row `index`
    pub fn threshold(&self, index: usize) -> Option<i32> {
        self.zones.get(index).map(|armed| armed.threshold)
    }

    /// Pick the first used zone whose threshold lies beyond `travelled`
    ///
    /// Past the last threshold the last used zone stays in force.
    pub fn evaluate(&self, travelled: i32, long_term_peak: f32) -> Option<TripEval> {
        let mut used = self.zones.iter().filter(|armed| armed.zone.zone != ZoneId::NotUsed);
        let mut selected = None;
        for armed in &mut used {
            selected = Some(armed);
            if armed.threshold > travelled {
                break;
            }
        }

        selected.map(|armed| TripEval {
            zone: armed.zone.zone,
            limit: armed.zone.limit(long_term_peak),
        })
    }
}
