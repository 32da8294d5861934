// Simulated swerve hardware
//
// In-memory stand-ins for the drive motor, steering motor and absolute
// encoder. They record the last command, integrate motion when advanced, and
// can be told to fail so error paths are testable without a robot.

use super::hardware::{AbsoluteSensor, ActuatorError, AngleActuator, DriveActuator, Result};

/// Free speed of a simulated motor at full output, rad/s (roughly a NEO)
pub const SIM_MOTOR_FREE_SPEED: f64 = 590.0;

/// Simulated drive motor
#[derive(Debug, Clone)]
pub struct SimDriveMotor {
    id: u8,
    speed: f64,
    position: f64,
    fault: Option<ActuatorError>,
}

impl SimDriveMotor {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            speed: 0.0,
            position: 0.0,
            fault: None,
        }
    }

    /// Last commanded output
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Make every following call fail with `error` until cleared
    pub fn inject_fault(&mut self, error: ActuatorError) {
        self.fault = Some(error);
    }

    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Integrate wheel travel over `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        self.position += self.speed * SIM_MOTOR_FREE_SPEED * dt / std::f64::consts::TAU;
    }

    fn check(&self) -> Result<()> {
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl DriveActuator for SimDriveMotor {
    fn id(&self) -> u8 {
        self.id
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.check()?;
        if !(-1.0..=1.0).contains(&speed) {
            return Err(ActuatorError::Rejected {
                id: self.id,
                reason: format!("speed {} out of range", speed),
            });
        }
        self.speed = speed;
        Ok(())
    }

    fn position(&mut self) -> Result<f64> {
        self.check()?;
        Ok(self.position)
    }

    fn set_position(&mut self, rotations: f64) -> Result<()> {
        self.check()?;
        self.position = rotations;
        Ok(())
    }
}

/// Simulated steering motor
#[derive(Debug, Clone)]
pub struct SimAngleMotor {
    id: u8,
    speed: f64,
    position: f64,
    fault: Option<ActuatorError>,
    commands: usize,
}

impl SimAngleMotor {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            speed: 0.0,
            position: 0.0,
            fault: None,
            commands: 0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Motor shaft angle in radians
    pub fn shaft_position(&self) -> f64 {
        self.position
    }

    /// Number of accepted speed commands
    pub fn commands(&self) -> usize {
        self.commands
    }

    pub fn inject_fault(&mut self, error: ActuatorError) {
        self.fault = Some(error);
    }

    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Integrate shaft rotation over `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        self.position += self.speed * SIM_MOTOR_FREE_SPEED * dt;
    }

    fn check(&self) -> Result<()> {
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl AngleActuator for SimAngleMotor {
    fn id(&self) -> u8 {
        self.id
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.check()?;
        if !(-1.0..=1.0).contains(&speed) {
            return Err(ActuatorError::Rejected {
                id: self.id,
                reason: format!("speed {} out of range", speed),
            });
        }
        self.speed = speed;
        self.commands += 1;
        Ok(())
    }

    fn position(&mut self) -> Result<f64> {
        self.check()?;
        Ok(self.position)
    }

    fn set_position(&mut self, radians: f64) -> Result<()> {
        self.check()?;
        self.position = radians;
        Ok(())
    }
}

/// Simulated absolute encoder
#[derive(Debug, Clone)]
pub struct SimAbsoluteSensor {
    id: u8,
    reading: f64,
    connected: bool,
}

impl SimAbsoluteSensor {
    /// Sensor reporting a fixed `reading` in turns
    pub fn new(id: u8, reading: f64) -> Self {
        Self {
            id,
            reading,
            connected: true,
        }
    }

    pub fn set_reading(&mut self, turns: f64) {
        self.reading = turns;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn reconnect(&mut self) {
        self.connected = true;
    }
}

impl AbsoluteSensor for SimAbsoluteSensor {
    fn id(&self) -> u8 {
        self.id
    }

    fn absolute_position(&mut self) -> Result<f64> {
        if !self.connected {
            return Err(ActuatorError::Disconnected { id: self.id });
        }
        Ok(self.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_angle_motor_integrates() {
        let mut motor = SimAngleMotor::new(2);
        motor.set_speed(0.5).unwrap();
        motor.advance(0.1);
        assert!((motor.shaft_position() - 0.5 * SIM_MOTOR_FREE_SPEED * 0.1).abs() < 1e-9);
        assert_eq!(motor.commands(), 1);
    }

    #[test]
    fn test_sim_rejects_out_of_range_speed() {
        let mut motor = SimDriveMotor::new(1);
        let err = motor.set_speed(1.5).unwrap_err();
        assert!(matches!(err, ActuatorError::Rejected { id: 1, .. }));
        assert_eq!(motor.speed(), 0.0);
    }

    #[test]
    fn test_sim_fault_injection() {
        let mut motor = SimAngleMotor::new(4);
        motor.inject_fault(ActuatorError::Timeout { id: 4 });
        assert_eq!(motor.position(), Err(ActuatorError::Timeout { id: 4 }));
        motor.clear_fault();
        assert_eq!(motor.position(), Ok(0.0));
    }

    #[test]
    fn test_sim_sensor_disconnect() {
        let mut sensor = SimAbsoluteSensor::new(23, 0.2);
        assert_eq!(sensor.absolute_position(), Ok(0.2));
        sensor.disconnect();
        assert!(sensor.absolute_position().is_err());
        sensor.reconnect();
        assert_eq!(sensor.absolute_position(), Ok(0.2));
    }
}
