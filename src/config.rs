// Timeouts, topics, module configuration
use std::collections::HashSet;
use std::f64::consts::PI;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::swerve::angle::TAU;
use crate::swerve::{CalibrationOffset, ModuleConfig, ModuleLocation, SensorRange};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_BASE: &str = "swerve/cmd/base"; // commands

// Steering reduction: wheel turns per motor turn
pub const ANGLE_MOTOR_GEAR_RATIO: f64 = (14.0 / 50.0) * (10.0 / 60.0);

// Proportional gain on motor-frame steering error
pub const ANGLE_P_GAIN: f64 = 0.05;

// 14 ft/s
pub const MAX_SPEED_MPS: f64 = 4.2672;

// Half the distance between module centers, meters
const MODULE_OFFSET: f64 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tuning shared by all modules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleTuning {
    pub gear_ratio: f64,
    pub p_gain: f64,
    pub max_speed_mps: f64,
    #[serde(default)]
    pub sensor_range: SensorRange,
}

impl Default for ModuleTuning {
    fn default() -> Self {
        Self {
            gear_ratio: ANGLE_MOTOR_GEAR_RATIO,
            p_gain: ANGLE_P_GAIN,
            max_speed_mps: MAX_SPEED_MPS,
            sensor_range: SensorRange::SignedHalf,
        }
    }
}

/// Calibration record and wiring for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub drive_id: u8,
    pub angle_id: u8,
    pub encoder_id: u8,
    pub location: ModuleLocation,
    /// Positive is counter-clockwise
    pub calibration_offset: f64,
}

impl ModuleSpec {
    pub fn module_config(&self, tuning: &ModuleTuning) -> ModuleConfig {
        ModuleConfig {
            gear_ratio: tuning.gear_ratio,
            p_gain: tuning.p_gain,
            max_speed_mps: tuning.max_speed_mps,
            calibration_offset: CalibrationOffset::from_radians(self.calibration_offset),
            sensor_range: tuning.sensor_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwerveConfig {
    #[serde(default)]
    pub tuning: ModuleTuning,
    pub modules: Vec<ModuleSpec>,
}

impl Default for SwerveConfig {
    fn default() -> Self {
        let module = |name: &str, drive_id: u8, encoder_id: u8, x: f64, y: f64, offset: f64| ModuleSpec {
            name: name.to_string(),
            drive_id,
            angle_id: drive_id + 1,
            encoder_id,
            location: ModuleLocation::new(x, y),
            calibration_offset: offset,
        };

        Self {
            tuning: ModuleTuning::default(),
            modules: vec![
                module("front_left", 1, 23, MODULE_OFFSET, MODULE_OFFSET, -1.744 + TAU),
                module("front_right", 3, 24, MODULE_OFFSET, -MODULE_OFFSET, 2.0678),
                module("back_left", 5, 25, -MODULE_OFFSET, MODULE_OFFSET, -2.0801 + PI),
                module("back_right", 7, 26, -MODULE_OFFSET, -MODULE_OFFSET, 2.8041),
            ],
        }
    }
}

impl SwerveConfig {
    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };
        positive("gear_ratio", self.tuning.gear_ratio)?;
        positive("p_gain", self.tuning.p_gain)?;
        positive("max_speed_mps", self.tuning.max_speed_mps)?;

        if self.modules.len() != 4 {
            return Err(ConfigError::Invalid(format!(
                "expected 4 modules, got {}",
                self.modules.len()
            )));
        }
        let mut motor_ids = HashSet::new();
        let mut encoder_ids = HashSet::new();
        for spec in &self.modules {
            for id in [spec.drive_id, spec.angle_id] {
                if !motor_ids.insert(id) {
                    return Err(ConfigError::Invalid(format!(
                        "{}: motor id {} is already in use",
                        spec.name, id
                    )));
                }
            }
            if !encoder_ids.insert(spec.encoder_id) {
                return Err(ConfigError::Invalid(format!(
                    "{}: encoder id {} is already in use",
                    spec.name, spec.encoder_id
                )));
            }
            if !spec.calibration_offset.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{}: calibration_offset must be finite",
                    spec.name
                )));
            }
            if !spec.location.x.is_finite() || !spec.location.y.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{}: location must be finite",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SwerveConfig::default();
        config.validate().unwrap();
        assert_eq!(config.modules[0].encoder_id, 23);
        assert_eq!(config.modules[3].angle_id, 8);
    }

    #[test]
    fn test_default_offsets_fold_into_one_turn() {
        let config = SwerveConfig::default();
        for spec in &config.modules {
            let turns = spec.module_config(&config.tuning).calibration_offset.turns();
            assert!((0.0..1.0).contains(&turns), "{}: {}", spec.name, turns);
        }
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = SwerveConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed = SwerveConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_tuning_defaults_when_omitted() {
        let json = r#"{"modules":[
            {"name":"a","drive_id":1,"angle_id":2,"encoder_id":23,"location":{"x":0.3,"y":0.3},"calibration_offset":0.1},
            {"name":"b","drive_id":3,"angle_id":4,"encoder_id":24,"location":{"x":0.3,"y":-0.3},"calibration_offset":0.2},
            {"name":"c","drive_id":5,"angle_id":6,"encoder_id":25,"location":{"x":-0.3,"y":0.3},"calibration_offset":0.3},
            {"name":"d","drive_id":7,"angle_id":8,"encoder_id":26,"location":{"x":-0.3,"y":-0.3},"calibration_offset":0.4}
        ]}"#;
        let config = SwerveConfig::from_json(json).unwrap();
        assert_eq!(config.tuning, ModuleTuning::default());
        assert_eq!(config.modules[2].name, "c");
    }

    #[test]
    fn test_wrong_module_count_rejected() {
        let mut config = SwerveConfig::default();
        config.modules.pop();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_positive_gear_ratio_rejected() {
        let mut config = SwerveConfig::default();
        config.tuning.gear_ratio = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid config: gear_ratio must be positive, got 0");
    }

    #[test]
    fn test_duplicate_device_ids_rejected() {
        let mut config = SwerveConfig::default();
        config.modules[2].drive_id = config.modules[0].angle_id;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid config: back_left: motor id 2 is already in use");

        let mut config = SwerveConfig::default();
        config.modules[3].encoder_id = 24;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid config: back_right: encoder id 24 is already in use");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SwerveConfig::load("/nonexistent/swerve.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
