// Define message types for the runtime

use serde::{Deserialize, Serialize};

/// Target for one module in physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleCommand {
    /// Wheel heading in radians
    pub angle: f64,
    /// Drive speed in m/s
    pub speed_mps: f64,
}

// Command from teleop/scripts -> runtime
// Either intent-level drive + turn, or one state per module from a
// kinematics solver. Tagged by "mode" on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaseCommand {
    /// Heading in radians, speeds normalized to [-1, 1]
    DriveTurn {
        drive_angle: f64,
        drive_speed: f64,
        turn_speed: f64,
    },
    /// One entry per module, in configuration order
    ModuleStates { modules: Vec<ModuleCommand> },
}

/// Runtime health as seen by the watchdog
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
