// Single swerve module controller
//
// Owns one wheel's drive motor, steering motor and absolute encoder. The
// steering motor's relative encoder is seeded from the absolute encoder, then
// each tick the wheel angle is read back from it and a proportional command
// is issued along the shortest path to the target heading.

use tracing::{debug, info, warn};

use super::angle::{TAU, clamp_speed, error_to_speed, normalize, shortest_error};
use super::calibration::{CalibrationOffset, SensorRange, read_seed_angle};
use super::error::{InvalidState, Result, ensure_finite};
use super::hardware::{AbsoluteSensor, AngleActuator, DriveActuator};
use super::mixer::{Intent, ModuleLocation, mix, turn_angle};

/// Fixed tuning for one module
///
/// Fields are checked by [`validate`](Self::validate) when the module is
/// calibrated; a module with bad tuning never leaves UNCALIBRATED.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleConfig {
    /// Wheel rotations per steering motor rotation
    pub gear_ratio: f64,
    /// Proportional gain on the motor-frame angle error
    pub p_gain: f64,
    /// Drive speed that maps to full output, m/s
    pub max_speed_mps: f64,
    pub calibration_offset: CalibrationOffset,
    pub sensor_range: SensorRange,
}

impl ModuleConfig {
    /// Reject gains and ratios that are zero, negative or non-finite
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("gear_ratio", self.gear_ratio),
            ("p_gain", self.p_gain),
            ("max_speed_mps", self.max_speed_mps),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(InvalidState::InvalidTuning { field, value }.into());
            }
        }
        Ok(())
    }
}

/// Target heading (radians) and normalized drive speed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModuleState {
    pub angle: f64,
    pub speed: f64,
}

impl ModuleState {
    pub fn new(angle: f64, speed: f64) -> Self {
        Self { angle, speed }
    }
}

/// Wheel angle tracked through the steering motor's relative encoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleEstimate {
    /// Normalized wheel-frame angle from the last read
    pub relative_angle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Uncalibrated,
    Calibrated { estimate: ModuleEstimate },
}

/// The three devices a module drives
#[derive(Debug)]
pub struct ModuleHardware<D, A, S> {
    pub drive: D,
    pub angle: A,
    pub sensor: S,
}

pub struct SwerveModule<D, A, S> {
    name: String,
    config: ModuleConfig,
    hardware: ModuleHardware<D, A, S>,
    turn_angle: f64,
    last_target: Option<f64>,
    status: Status,
}

impl<D, A, S> SwerveModule<D, A, S>
where
    D: DriveActuator,
    A: AngleActuator,
    S: AbsoluteSensor,
{
    /// Create an uncalibrated module
    ///
    /// Commands are rejected until [`reset_encoders`](Self::reset_encoders)
    /// succeeds.
    pub fn new(
        name: impl Into<String>,
        config: ModuleConfig,
        location: ModuleLocation,
        hardware: ModuleHardware<D, A, S>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            hardware,
            turn_angle: turn_angle(location),
            last_target: None,
            status: Status::Uncalibrated,
        }
    }

    /// Create a module and calibrate it from the absolute encoder
    pub fn calibrated(
        name: impl Into<String>,
        config: ModuleConfig,
        location: ModuleLocation,
        hardware: ModuleHardware<D, A, S>,
    ) -> Result<Self> {
        let mut module = Self::new(name, config, location, hardware);
        module.reset_encoders()?;
        Ok(module)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn hardware(&self) -> &ModuleHardware<D, A, S> {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut ModuleHardware<D, A, S> {
        &mut self.hardware
    }

    /// Heading used for in-place rotation
    pub fn turn_angle(&self) -> f64 {
        self.turn_angle
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.status, Status::Calibrated { .. })
    }

    /// Estimate from the most recent encoder read
    pub fn estimate(&self) -> Option<ModuleEstimate> {
        match self.status {
            Status::Calibrated { estimate } => Some(estimate),
            Status::Uncalibrated => None,
        }
    }

    /// True wheel angle from the absolute encoder, ignoring relative drift
    pub fn absolute_angle(&mut self) -> Result<f64> {
        let seed = read_seed_angle(
            &mut self.hardware.sensor,
            self.config.calibration_offset,
            self.config.sensor_range,
        )?;
        Ok(normalize(seed))
    }

    /// Zero the drive distance and reseed the steering encoder
    ///
    /// On failure the module is left uncalibrated and must be reset again
    /// before it accepts commands.
    pub fn reset_encoders(&mut self) -> Result<()> {
        self.status = Status::Uncalibrated;

        let wheel_angle = match self.seed_encoders() {
            Ok(angle) => angle,
            Err(e) => {
                warn!("{}: calibration failed: {}", self.name, e);
                return Err(e);
            }
        };

        self.status = Status::Calibrated {
            estimate: ModuleEstimate {
                relative_angle: wheel_angle,
            },
        };
        info!(
            "{}: calibrated, wheel angle {:.4} rad (offset {:.4} rad)",
            self.name,
            wheel_angle,
            self.config.calibration_offset.radians()
        );
        Ok(())
    }

    fn seed_encoders(&mut self) -> Result<f64> {
        self.config.validate()?;
        let wheel_angle = self.absolute_angle()?;
        self.hardware.drive.set_position(0.0)?;
        self.hardware
            .angle
            .set_position(wheel_angle / self.config.gear_ratio)?;
        Ok(wheel_angle)
    }

    /// Current wheel angle from the steering motor's encoder
    pub fn wheel_angle(&mut self) -> Result<f64> {
        if !self.is_calibrated() {
            return Err(InvalidState::Uncalibrated.into());
        }
        let motor_radians = self.hardware.angle.position()?;
        Ok(normalize(motor_radians * self.config.gear_ratio))
    }

    /// Drive toward `state`; speed is normalized to [-1, 1]
    pub fn set_state(&mut self, state: ModuleState) -> Result<()> {
        ensure_finite("angle", state.angle)?;
        ensure_finite("speed", state.speed)?;

        let current = self.wheel_angle()?;
        let target = normalize(state.angle);
        let wheel_error = shortest_error(target, current);
        let motor_error = wheel_error / self.config.gear_ratio;
        let angle_speed = error_to_speed(motor_error, self.config.p_gain);
        let drive_speed = clamp_speed(state.speed);

        debug!(
            "{}: target={:.4} current={:.4} error={:.4} angle_out={:.4} drive_out={:.4}",
            self.name, target, current, wheel_error, angle_speed, drive_speed
        );

        self.hardware.angle.set_speed(angle_speed)?;
        self.hardware.drive.set_speed(drive_speed)?;

        self.status = Status::Calibrated {
            estimate: ModuleEstimate {
                relative_angle: current,
            },
        };
        self.last_target = Some(target);
        Ok(())
    }

    /// Same as [`set_state`](Self::set_state) with drive speed in m/s
    pub fn set_velocity(&mut self, angle: f64, speed_mps: f64) -> Result<()> {
        ensure_finite("speed", speed_mps)?;
        self.set_state(ModuleState::new(
            angle,
            speed_mps / self.config.max_speed_mps,
        ))
    }

    /// Combine a translation intent with rotation about the chassis center
    pub fn set_drive_turn(
        &mut self,
        drive_angle: f64,
        drive_speed: f64,
        turn_speed: f64,
    ) -> Result<()> {
        ensure_finite("drive_angle", drive_angle)?;
        ensure_finite("drive_speed", drive_speed)?;
        ensure_finite("turn_speed", turn_speed)?;

        let prior = match (self.last_target, self.estimate()) {
            (Some(target), _) => target,
            (None, Some(estimate)) => estimate.relative_angle,
            (None, None) => return Err(InvalidState::Uncalibrated.into()),
        };
        let state = mix(
            Intent::new(drive_angle, drive_speed),
            Intent::new(self.turn_angle, turn_speed),
            prior,
        );
        self.set_state(state)
    }

    /// Command zero output on both motors
    pub fn stop(&mut self) -> Result<()> {
        self.hardware.angle.set_speed(0.0)?;
        self.hardware.drive.set_speed(0.0)?;
        Ok(())
    }

    /// Steering motor position in rotations
    pub fn angle_motor_rotations(&mut self) -> Result<f64> {
        Ok(self.hardware.angle.position()? / TAU)
    }

    /// Drive motor travel in rotations since the last reset
    pub fn drive_rotations(&mut self) -> Result<f64> {
        Ok(self.hardware.drive.position()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swerve::error::SwerveError;
    use crate::swerve::hardware::ActuatorError;
    use crate::swerve::sim::{SimAbsoluteSensor, SimAngleMotor, SimDriveMotor};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const GEAR_RATIO: f64 = (14.0 / 50.0) * (10.0 / 60.0);
    const P_GAIN: f64 = 0.05;

    type SimModule = SwerveModule<SimDriveMotor, SimAngleMotor, SimAbsoluteSensor>;

    fn config(offset_radians: f64) -> ModuleConfig {
        ModuleConfig {
            gear_ratio: GEAR_RATIO,
            p_gain: P_GAIN,
            max_speed_mps: 4.0,
            calibration_offset: CalibrationOffset::from_radians(offset_radians),
            sensor_range: SensorRange::SignedHalf,
        }
    }

    fn sim_module(reading_turns: f64, offset_radians: f64) -> SimModule {
        SwerveModule::new(
            "front_left",
            config(offset_radians),
            ModuleLocation::new(1.0, 0.0),
            ModuleHardware {
                drive: SimDriveMotor::new(1),
                angle: SimAngleMotor::new(2),
                sensor: SimAbsoluteSensor::new(23, reading_turns),
            },
        )
    }

    /// Put the wheel at `wheel_angle` without going through calibration
    fn place_wheel(module: &mut SimModule, wheel_angle: f64) {
        module
            .hardware_mut()
            .angle
            .set_position(wheel_angle / GEAR_RATIO)
            .unwrap();
    }

    #[test]
    fn test_set_state_before_calibration_is_rejected() {
        let mut module = sim_module(0.0, 0.0);
        let err = module.set_state(ModuleState::new(1.0, 0.5)).unwrap_err();
        assert_eq!(err, SwerveError::InvalidState(InvalidState::Uncalibrated));
        assert_eq!(module.hardware().angle.commands(), 0);
        assert_eq!(module.hardware().drive.speed(), 0.0);
    }

    #[test]
    fn test_bad_tuning_blocks_calibration() {
        let mut module = sim_module(0.25, 0.0);
        module.config.p_gain = -0.05;

        let err = module.reset_encoders().unwrap_err();
        assert_eq!(
            err,
            SwerveError::InvalidState(InvalidState::InvalidTuning {
                field: "p_gain",
                value: -0.05
            })
        );
        assert!(!module.is_calibrated());

        // Zero error would otherwise saturate with a negative gain
        assert!(module.set_state(ModuleState::new(PI / 2.0, 0.0)).is_err());
        assert_eq!(module.hardware().angle.commands(), 0);
    }

    #[test]
    fn test_config_validate_rejects_zero_gear_ratio() {
        let mut bad = config(0.0);
        bad.gear_ratio = 0.0;
        assert!(bad.validate().is_err());
        bad.gear_ratio = f64::NAN;
        assert!(bad.validate().is_err());
        config(0.0).validate().unwrap();
    }

    #[test]
    fn test_calibration_seeds_angle_encoder() {
        let mut module = sim_module(0.25, 0.0);
        module.reset_encoders().unwrap();
        assert!(module.is_calibrated());
        assert_relative_eq!(module.wheel_angle().unwrap(), PI / 2.0, epsilon = 1e-9);
        assert_relative_eq!(
            module.hardware().angle.shaft_position(),
            (PI / 2.0) / GEAR_RATIO,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            module.angle_motor_rotations().unwrap(),
            0.25 / GEAR_RATIO,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_calibration_applies_offset() {
        let mut module = sim_module(0.25, PI / 4.0);
        module.reset_encoders().unwrap();
        assert_relative_eq!(module.wheel_angle().unwrap(), PI / 4.0, epsilon = 1e-9);
        assert_relative_eq!(module.absolute_angle().unwrap(), PI / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_zeroes_drive_distance() {
        let mut module = sim_module(0.0, 0.0);
        module.hardware_mut().drive.set_position(12.5).unwrap();
        module.reset_encoders().unwrap();
        assert_eq!(module.drive_rotations().unwrap(), 0.0);
    }

    #[test]
    fn test_on_target_holds_steering() {
        let mut module = sim_module(0.25, 0.0);
        module.reset_encoders().unwrap();
        module.set_state(ModuleState::new(PI / 2.0, 0.5)).unwrap();
        assert_relative_eq!(module.hardware().angle.speed(), 0.0, epsilon = 1e-9);
        assert_eq!(module.hardware().drive.speed(), 0.5);
    }

    #[test]
    fn test_wraparound_takes_short_path() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();
        place_wheel(&mut module, 6.2);

        module.set_state(ModuleState::new(0.1, 0.0)).unwrap();

        let wheel_error = 0.1 - 6.2 + TAU;
        let expected = wheel_error / GEAR_RATIO / PI * P_GAIN;
        println!("angle output across zero: {}", module.hardware().angle.speed());
        assert!(module.hardware().angle.speed() > 0.0);
        assert_relative_eq!(module.hardware().angle.speed(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_speeds_are_clamped() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();
        module.set_state(ModuleState::new(PI * 0.99, 3.0)).unwrap();
        assert_eq!(module.hardware().angle.speed(), 1.0);
        assert_eq!(module.hardware().drive.speed(), 1.0);
    }

    #[test]
    fn test_non_finite_state_touches_nothing() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();

        for state in [
            ModuleState::new(f64::NAN, 0.5),
            ModuleState::new(1.0, f64::INFINITY),
            ModuleState::new(f64::NEG_INFINITY, 0.0),
        ] {
            let err = module.set_state(state).unwrap_err();
            assert!(matches!(
                err,
                SwerveError::InvalidState(InvalidState::NonFinite { .. })
            ));
        }
        assert_eq!(module.hardware().angle.commands(), 0);
        assert_eq!(module.hardware().drive.speed(), 0.0);
    }

    #[test]
    fn test_set_velocity_scales_by_max_speed() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();
        module.set_velocity(0.0, 2.0).unwrap();
        assert_relative_eq!(module.hardware().drive.speed(), 0.5, epsilon = 1e-12);
        assert!(module.set_velocity(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_drive_turn_pure_rotation_uses_turn_angle() {
        // Module on the +x axis turns toward +y
        let mut module = sim_module(0.25, 0.0);
        module.reset_encoders().unwrap();
        module.set_drive_turn(0.0, 0.0, 1.0).unwrap();
        assert_relative_eq!(module.hardware().angle.speed(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(module.hardware().drive.speed(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drive_turn_idle_keeps_heading() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();
        module.set_state(ModuleState::new(1.0, 0.0)).unwrap();

        module.set_drive_turn(0.0, 0.0, 0.0).unwrap();
        assert_eq!(module.hardware().drive.speed(), 0.0);
        // Steering still chases the previous target rather than snapping to zero
        assert!(module.hardware().angle.speed() > 0.0);
    }

    #[test]
    fn test_actuator_failure_keeps_estimate() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();
        module.set_state(ModuleState::new(0.5, 0.2)).unwrap();
        let before = module.estimate();

        module
            .hardware_mut()
            .angle
            .inject_fault(ActuatorError::Timeout { id: 2 });
        let err = module.set_state(ModuleState::new(1.0, 0.8)).unwrap_err();
        assert_eq!(err, SwerveError::ActuatorCommand(ActuatorError::Timeout { id: 2 }));
        assert_eq!(module.estimate(), before);
        // Drive keeps the last good command
        assert_eq!(module.hardware().drive.speed(), 0.2);
    }

    #[test]
    fn test_failed_reset_uncalibrates() {
        let mut module = sim_module(0.1, 0.0);
        module.reset_encoders().unwrap();

        module.hardware_mut().sensor.disconnect();
        let err = module.reset_encoders().unwrap_err();
        assert!(matches!(err, SwerveError::Calibration(_)));
        assert!(!module.is_calibrated());
        assert!(module.set_state(ModuleState::new(0.0, 0.0)).is_err());

        module.hardware_mut().sensor.reconnect();
        module.reset_encoders().unwrap();
        assert!(module.set_state(ModuleState::new(0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_out_of_range_reading_never_calibrates() {
        let result = SwerveModule::calibrated(
            "back_right",
            config(0.0),
            ModuleLocation::new(-0.3, -0.3),
            ModuleHardware {
                drive: SimDriveMotor::new(7),
                angle: SimAngleMotor::new(8),
                sensor: SimAbsoluteSensor::new(26, 3.0),
            },
        );
        assert!(matches!(result, Err(SwerveError::Calibration(_))));
    }

    #[test]
    fn test_stop_works_uncalibrated() {
        let mut module = sim_module(0.0, 0.0);
        module.stop().unwrap();
        assert_eq!(module.hardware().angle.speed(), 0.0);
        assert_eq!(module.hardware().drive.speed(), 0.0);
    }

    #[test]
    fn test_closed_loop_converges() {
        let mut module = sim_module(0.0, 0.0);
        module.reset_encoders().unwrap();

        let target = 2.0;
        for _ in 0..200 {
            module.set_state(ModuleState::new(target, 0.0)).unwrap();
            module.hardware_mut().angle.advance(0.02);
        }

        let error = shortest_error(target, module.wheel_angle().unwrap());
        println!("settled error: {}", error);
        assert!(error.abs() < 1e-3);
    }
}
