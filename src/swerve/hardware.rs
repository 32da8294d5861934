// Hardware capabilities consumed by a swerve module
//
// The core never talks to a vendor API directly. Motor controllers and
// encoders are reached through these traits so simulated and real devices
// are interchangeable.

/// Error types for actuator and sensor communication
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuatorError {
    #[error("Device {id} rejected command: {reason}")]
    Rejected { id: u8, reason: String },

    #[error("Timeout waiting for response from device {id}")]
    Timeout { id: u8 },

    #[error("Device {id} is disconnected")]
    Disconnected { id: u8 },
}

pub type Result<T> = std::result::Result<T, ActuatorError>;

/// Wheel drive motor
pub trait DriveActuator {
    /// Device identifier, used in logs and errors
    fn id(&self) -> u8;

    /// Normalized output in [-1, 1]
    fn set_speed(&mut self, speed: f64) -> Result<()>;

    /// Accumulated wheel travel in motor rotations
    fn position(&mut self) -> Result<f64>;

    fn set_position(&mut self, rotations: f64) -> Result<()>;
}

/// Steering motor with its own incremental encoder
pub trait AngleActuator {
    fn id(&self) -> u8;

    /// Normalized output in [-1, 1]
    fn set_speed(&mut self, speed: f64) -> Result<()>;

    /// Motor shaft angle in radians, before the steering gear reduction
    fn position(&mut self) -> Result<f64>;

    fn set_position(&mut self, radians: f64) -> Result<()>;
}

/// Absolute steering encoder
///
/// Magnet offset and direction polarity are configured on the device when
/// it is constructed; the reading reported here already includes them.
pub trait AbsoluteSensor {
    fn id(&self) -> u8;

    /// Absolute wheel angle in turns
    fn absolute_position(&mut self) -> Result<f64>;
}
