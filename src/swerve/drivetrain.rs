// Four-module swerve drivetrain
//
// Fans one command out to every module. A fault on one module never stops
// the others from being commanded; all faults come back together.

use tracing::{debug, info, warn};

use super::error::{DrivetrainError, InvalidState, SwerveError};
use super::hardware::{AbsoluteSensor, AngleActuator, DriveActuator};
use super::module::SwerveModule;
use crate::messages::BaseCommand;

pub struct Drivetrain<D, A, S>
where
    D: DriveActuator,
    A: AngleActuator,
    S: AbsoluteSensor,
{
    modules: Vec<SwerveModule<D, A, S>>,
}

impl<D, A, S> Drivetrain<D, A, S>
where
    D: DriveActuator,
    A: AngleActuator,
    S: AbsoluteSensor,
{
    pub fn new(modules: Vec<SwerveModule<D, A, S>>) -> Self {
        Self { modules }
    }

    pub fn modules(&self) -> &[SwerveModule<D, A, S>] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut [SwerveModule<D, A, S>] {
        &mut self.modules
    }

    /// Calibrate every module from its absolute encoder
    ///
    /// This must be called before sending commands. Modules that fail stay
    /// uncalibrated; the rest are usable.
    pub fn initialize(&mut self) -> Result<(), DrivetrainError> {
        info!("Calibrating {} swerve modules", self.modules.len());
        let result = self.for_each(|module| module.reset_encoders());
        if result.is_ok() {
            info!("Modules calibrated successfully");
        }
        result
    }

    /// Apply a command to every module
    pub fn apply(&mut self, command: &BaseCommand) -> Result<(), DrivetrainError> {
        match command {
            BaseCommand::DriveTurn {
                drive_angle,
                drive_speed,
                turn_speed,
            } => {
                debug!(
                    "Drive/turn: angle={:.3} speed={:.3} turn={:.3}",
                    drive_angle, drive_speed, turn_speed
                );
                self.for_each(|module| {
                    module.set_drive_turn(*drive_angle, *drive_speed, *turn_speed)
                })
            }
            BaseCommand::ModuleStates { modules } => {
                if modules.len() != self.modules.len() {
                    let err = SwerveError::from(InvalidState::ModuleCountMismatch {
                        expected: self.modules.len(),
                        actual: modules.len(),
                    });
                    return Err(DrivetrainError {
                        faults: vec![("drivetrain".to_string(), err)],
                    });
                }
                let mut faults = Vec::new();
                for (module, target) in self.modules.iter_mut().zip(modules) {
                    if let Err(e) = module.set_velocity(target.angle, target.speed_mps) {
                        faults.push((module.name().to_string(), e));
                    }
                }
                Self::collect(faults)
            }
        }
    }

    /// Stop all modules immediately
    pub fn stop(&mut self) -> Result<(), DrivetrainError> {
        self.for_each(|module| module.stop())
    }

    fn for_each<F>(&mut self, mut op: F) -> Result<(), DrivetrainError>
    where
        F: FnMut(&mut SwerveModule<D, A, S>) -> Result<(), SwerveError>,
    {
        let mut faults = Vec::new();
        for module in &mut self.modules {
            if let Err(e) = op(module) {
                faults.push((module.name().to_string(), e));
            }
        }
        Self::collect(faults)
    }

    fn collect(faults: Vec<(String, SwerveError)>) -> Result<(), DrivetrainError> {
        if faults.is_empty() {
            Ok(())
        } else {
            for (name, e) in &faults {
                warn!("Module {} fault: {}", name, e);
            }
            Err(DrivetrainError { faults })
        }
    }
}

impl<D, A, S> Drop for Drivetrain<D, A, S>
where
    D: DriveActuator,
    A: AngleActuator,
    S: AbsoluteSensor,
{
    fn drop(&mut self) {
        // Try to stop motors when the drivetrain goes away
        if let Err(e) = self.stop() {
            warn!("Failed to stop modules on drop: {}", e);
        }
    }
}
