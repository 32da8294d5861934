// 50 Hz loop with watchdog
// Note: a watchdog is a safety mechanism that triggers a safe action if something goes wrong
// Eg. if teleop crashes and stops sending commands, the wheels are stopped instead of
// holding the last command forever

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::messages::{BaseCommand, RuntimeHealth};
use crate::swerve::{AbsoluteSensor, AngleActuator, DriveActuator, Drivetrain};

/// Shortest loop period the runtime will run at (1 kHz)
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Loop settings, usually taken from `config` and the CLI
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub loop_hz: u64,
    pub cmd_timeout: Duration,
    pub topic: String,
}

pub struct Runtime {
    latest_cmd: Option<BaseCommand>,
    cmd_received_at: Instant,
    cmd_timeout: Duration,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(cmd_timeout: Duration) -> Self {
        Self {
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            cmd_timeout,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: BaseCommand) {
        self.on_command_at(cmd, Instant::now());
    }

    fn on_command_at(&mut self, cmd: BaseCommand, now: Instant) {
        info!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Command to apply this tick, or None if the drivetrain should stop
    pub fn compute_command(&mut self) -> Option<&BaseCommand> {
        self.compute_command_at(Instant::now())
    }

    fn compute_command_at(&mut self, now: Instant) -> Option<&BaseCommand> {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        if cmd_age > self.cmd_timeout {
            // Watchdog triggered - stop the robot
            if self.health != RuntimeHealth::CmdStale {
                warn!("Command stale ({:?} old), stopping robot", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            None
        } else if let Some(ref cmd) = self.latest_cmd {
            if self.health != RuntimeHealth::Ok {
                info!("Command stream healthy");
            }
            self.health = RuntimeHealth::Ok;
            Some(cmd)
        } else {
            // No command ever received
            self.health = RuntimeHealth::CmdStale;
            None
        }
    }
}

/// Run the control loop until the session fails
///
/// `after_tick` is called once per tick with the tick period, after the
/// drivetrain has been commanded (simulated hardware advances here).
pub async fn run<D, A, S, F>(
    options: RuntimeOptions,
    mut drivetrain: Drivetrain<D, A, S>,
    mut after_tick: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    D: DriveActuator,
    A: AngleActuator,
    S: AbsoluteSensor,
    F: FnMut(&mut Drivetrain<D, A, S>, Duration),
{
    // Calibration failures are not retried; affected modules reject commands
    if let Err(e) = drivetrain.initialize() {
        warn!("Starting with uncalibrated modules: {}", e);
    }

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up subscriber...");
    let subscriber = session.declare_subscriber(options.topic.clone()).await?;

    let period = tick_period(options.loop_hz);
    let mut runtime = Runtime::new(options.cmd_timeout);
    let mut tick = interval(period);

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        options.loop_hz,
        options.cmd_timeout.as_millis()
    );
    info!("Subscribed to: {}", options.topic);

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<BaseCommand>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Apply the command (includes watchdog logic)
        // Faults are already logged per module; keep looping
        let result = match runtime.compute_command() {
            Some(cmd) => drivetrain.apply(cmd),
            None => drivetrain.stop(),
        };
        if let Err(e) = result {
            warn!("Tick completed with faults: {}", e);
        }

        // 3. Let the hardware side advance
        after_tick(&mut drivetrain, period);
    }
}

/// Loop period for `loop_hz`, never shorter than [`MIN_TICK_PERIOD`]
///
/// `interval` panics on a zero period, so rates above the floor are capped.
pub fn tick_period(loop_hz: u64) -> Duration {
    Duration::from_secs_f64(1.0 / loop_hz.max(1) as f64).max(MIN_TICK_PERIOD)
}
