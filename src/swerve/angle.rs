// Angle math for swerve steering
// All angles are radians. Canonical range is [0, TAU).

use std::f64::consts::PI;

pub use std::f64::consts::TAU;

/// Coterminal angle in [0, TAU)
///
/// Uses a single floored modulo so the cost does not depend on the
/// magnitude of the input. Non-finite input comes back as NaN.
pub fn normalize(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Smallest signed correction from `current` to `target`, in (-PI, PI]
///
/// Both operands are wrapped first so the difference stays within one turn
/// and cannot overflow for large finite inputs.
pub fn shortest_error(target: f64, current: f64) -> f64 {
    let error = normalize(normalize(target) - normalize(current));
    if error > PI { error - TAU } else { error }
}

/// Proportional conversion of an angular error to a motor command
///
/// Saturates at +/-1 once |error| >= PI / gain.
pub fn error_to_speed(error: f64, gain: f64) -> f64 {
    let limit = PI / gain;
    if error >= limit {
        1.0
    } else if error <= -limit {
        -1.0
    } else {
        clamp_speed(error / PI * gain)
    }
}

/// Limit a motor command to [-1, 1]
pub fn clamp_speed(speed: f64) -> f64 {
    speed.clamp(-1.0, 1.0)
}

/// Direction of the vector (x, y) as a canonical angle
pub fn angle_from_components(y: f64, x: f64) -> f64 {
    normalize(y.atan2(x))
}
