// Absolute encoder calibration
//
// Turns an absolute sensor reading plus a fixed per-module offset into the
// wheel angle that seeds the steering motor's relative encoder.

use serde::{Deserialize, Serialize};

use super::angle::{TAU, normalize};
use super::hardware::{AbsoluteSensor, ActuatorError};

/// Reporting range of the absolute sensor, in turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorRange {
    /// [-0.5, 0.5]
    #[default]
    SignedHalf,
    /// [0, 1)
    Unsigned,
}

impl SensorRange {
    pub fn contains(self, turns: f64) -> bool {
        match self {
            SensorRange::SignedHalf => (-0.5..=0.5).contains(&turns),
            SensorRange::Unsigned => (0.0..1.0).contains(&turns),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("Absolute sensor unavailable: {0}")]
    SensorUnavailable(#[from] ActuatorError),

    #[error("Absolute sensor {id} returned non-finite reading {reading}")]
    NonFinite { id: u8, reading: f64 },

    #[error("Absolute sensor {id} reading {reading} turns is outside {range:?}")]
    OutOfRange {
        id: u8,
        reading: f64,
        range: SensorRange,
    },

    #[error("Calibration offset {0} is not finite")]
    InvalidOffset(f64),
}

/// Mounting correction between the sensor zero and wheel forward, in turns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOffset {
    turns: f64,
}

impl CalibrationOffset {
    /// Offset from radians, folded into one full turn
    pub fn from_radians(radians: f64) -> Self {
        Self {
            turns: normalize(radians) / TAU,
        }
    }

    pub fn from_turns(turns: f64) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> f64 {
        self.turns
    }

    pub fn radians(&self) -> f64 {
        self.turns * TAU
    }
}

/// Wheel-frame seed angle in radians (not normalized)
pub fn compute_seed_angle(
    absolute_turns: f64,
    offset_turns: f64,
) -> Result<f64, CalibrationError> {
    if !offset_turns.is_finite() {
        return Err(CalibrationError::InvalidOffset(offset_turns));
    }
    Ok(absolute_turns * TAU - offset_turns * TAU)
}

/// Read the sensor once and produce a validated seed angle
pub fn read_seed_angle<S: AbsoluteSensor>(
    sensor: &mut S,
    offset: CalibrationOffset,
    range: SensorRange,
) -> Result<f64, CalibrationError> {
    let id = sensor.id();
    let reading = sensor.absolute_position()?;

    if !reading.is_finite() {
        return Err(CalibrationError::NonFinite { id, reading });
    }
    if !range.contains(reading) {
        return Err(CalibrationError::OutOfRange { id, reading, range });
    }

    compute_seed_angle(reading, offset.turns())
}
