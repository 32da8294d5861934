// Swerve drive control core
//
// Provides:
// - Angle normalization and shortest-path steering error
// - Absolute encoder calibration
// - Per-module closed-loop steering and drive commands
// - Drive + turn vector mixing
// - Hardware capability traits with simulated implementations

pub mod angle;
pub mod calibration;
mod drivetrain;
mod error;
pub mod hardware;
pub mod mixer;
mod module;
pub mod sim;

pub use calibration::{CalibrationError, CalibrationOffset, SensorRange};
pub use drivetrain::Drivetrain;
pub use error::{DrivetrainError, InvalidState, SwerveError};
pub use hardware::{AbsoluteSensor, ActuatorError, AngleActuator, DriveActuator};
pub use mixer::{Intent, ModuleLocation};
pub use module::{ModuleConfig, ModuleEstimate, ModuleHardware, ModuleState, SwerveModule};
