pub mod config;
pub mod messages;
pub mod runtime;
pub mod swerve;

use config::SwerveConfig;
use swerve::sim::{SimAbsoluteSensor, SimAngleMotor, SimDriveMotor};
use swerve::{Drivetrain, ModuleHardware, SwerveModule};

pub type SimDrivetrain = Drivetrain<SimDriveMotor, SimAngleMotor, SimAbsoluteSensor>;

/// Build an uncalibrated drivetrain on simulated hardware
///
/// Each simulated encoder reads its module's calibration offset, so the
/// wheels calibrate to straight ahead.
pub fn sim_drivetrain(config: &SwerveConfig) -> SimDrivetrain {
    let modules = config
        .modules
        .iter()
        .map(|spec| {
            let module_config = spec.module_config(&config.tuning);
            let mut reading = module_config.calibration_offset.turns();
            if !module_config.sensor_range.contains(reading) {
                reading -= 1.0;
            }
            SwerveModule::new(
                spec.name.clone(),
                module_config,
                spec.location,
                ModuleHardware {
                    drive: SimDriveMotor::new(spec.drive_id),
                    angle: SimAngleMotor::new(spec.angle_id),
                    sensor: SimAbsoluteSensor::new(spec.encoder_id, reading),
                },
            )
        })
        .collect();
    Drivetrain::new(modules)
}
