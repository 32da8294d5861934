// Drive + turn command mixing
//
// Composes a translation intent and an in-place rotation intent into one
// wheel heading and speed. Each intent is a 2D vector (angle, speed); the
// module's turn direction is fixed by where it is mounted on the chassis.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::angle::{angle_from_components, clamp_speed, normalize};
use super::module::ModuleState;

/// Below this combined magnitude the heading is undefined
const MIN_MAGNITUDE: f64 = 1e-9;

/// Module position relative to the chassis center, in meters
/// x forward, y left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleLocation {
    pub x: f64,
    pub y: f64,
}

impl ModuleLocation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A motion intent as a polar vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    pub angle: f64,
    pub speed: f64,
}

impl Intent {
    pub fn new(angle: f64, speed: f64) -> Self {
        Self { angle, speed }
    }
}

/// Wheel heading that rotates the chassis counter-clockwise
///
/// Tangent to the circle through the module, i.e. the mounting direction
/// plus a quarter turn. Angles are counter-clockwise positive with x forward
/// and y left, so this is `atan2(y, x) + PI/2`, not `PI/2 - atan2(y, x)`.
pub fn turn_angle(location: ModuleLocation) -> f64 {
    normalize(angle_from_components(location.y, location.x) + FRAC_PI_2)
}

/// Sum two intents into one module state
///
/// When the vectors cancel out, the heading is undefined; the module keeps
/// `prior_angle` and the speed is zero.
pub fn mix(drive: Intent, turn: Intent, prior_angle: f64) -> ModuleState {
    let x = drive.speed * drive.angle.cos() + turn.speed * turn.angle.cos();
    let y = drive.speed * drive.angle.sin() + turn.speed * turn.angle.sin();

    let magnitude = x.hypot(y);
    if magnitude < MIN_MAGNITUDE {
        return ModuleState::new(normalize(prior_angle), 0.0);
    }

    ModuleState::new(angle_from_components(y, x), clamp_speed(magnitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_pure_translation() {
        let state = mix(Intent::new(0.0, 1.0), Intent::new(PI / 2.0, 0.0), 0.0);
        assert_relative_eq!(state.angle, 0.0, epsilon = 1e-12);
        assert_relative_eq!(state.speed, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pure_rotation() {
        let state = mix(Intent::new(0.0, 0.0), Intent::new(PI / 2.0, 1.0), 0.0);
        assert_relative_eq!(state.angle, PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(state.speed, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_magnitude_keeps_prior_angle() {
        let state = mix(Intent::new(0.0, 0.0), Intent::new(PI / 2.0, 0.0), 1.25);
        assert_eq!(state.angle, 1.25);
        assert_eq!(state.speed, 0.0);
        assert!(!state.angle.is_nan());
    }

    #[test]
    fn test_opposing_intents_cancel() {
        let state = mix(Intent::new(0.0, 0.5), Intent::new(PI, 0.5), 2.0);
        assert_eq!(state.angle, 2.0);
        assert_eq!(state.speed, 0.0);
    }

    #[test]
    fn test_combined_speed_is_clamped() {
        // Perpendicular full-speed intents give magnitude sqrt(2)
        let state = mix(Intent::new(0.0, 1.0), Intent::new(PI / 2.0, 1.0), 0.0);
        assert_relative_eq!(state.angle, PI / 4.0, epsilon = 1e-12);
        assert_eq!(state.speed, 1.0);
    }

    #[test]
    fn test_negative_drive_speed_flips_heading() {
        let state = mix(Intent::new(0.0, -0.5), Intent::new(PI / 2.0, 0.0), 0.0);
        assert_relative_eq!(state.angle, PI, epsilon = 1e-12);
        assert_relative_eq!(state.speed, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_turn_angle_is_tangent() {
        assert_relative_eq!(turn_angle(ModuleLocation::new(1.0, 0.0)), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(turn_angle(ModuleLocation::new(0.3, 0.3)), 3.0 * PI / 4.0, epsilon = 1e-12);
        assert_relative_eq!(turn_angle(ModuleLocation::new(-0.3, -0.3)), 7.0 * PI / 4.0, epsilon = 1e-12);
        // Front-right wraps past a full turn
        assert_relative_eq!(turn_angle(ModuleLocation::new(0.3, -0.3)), PI / 4.0, epsilon = 1e-12);
    }
}
