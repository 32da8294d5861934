// Error types for swerve module control

use super::calibration::CalibrationError;
use super::hardware::ActuatorError;

/// Command rejected before any actuator was touched
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidState {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive and finite, got {value}")]
    InvalidTuning { field: &'static str, value: f64 },

    #[error("Module has not been calibrated")]
    Uncalibrated,

    #[error("Expected {expected} module states, got {actual}")]
    ModuleCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwerveError {
    #[error("Calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Actuator command failed: {0}")]
    ActuatorCommand(#[from] ActuatorError),

    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidState),
}

pub type Result<T> = std::result::Result<T, SwerveError>;

/// Per-module failures from a drivetrain-wide operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} module(s) faulted: {}", .faults.len(), summarize(.faults))]
pub struct DrivetrainError {
    pub faults: Vec<(String, SwerveError)>,
}

fn summarize(faults: &[(String, SwerveError)]) -> String {
    faults
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reject NaN and infinities with the offending field named
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidState::NonFinite { field, value }.into())
    }
}
