// Keyboard teleop: WASD strafe, Z/X rotate, R/F speed, Q quit
// Publishes drive_turn commands for the swerve runtime.
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::f64::consts::{FRAC_PI_2, PI};
use std::time::{Duration, Instant};
use swerve_zenoh_runtime::config::TOPIC_CMD_BASE;
use swerve_zenoh_runtime::messages::BaseCommand;
use tracing::info;

const SPEEDS: [f64; 3] = [0.2, 0.5, 1.0]; // normalized
const TURN_SPEEDS: [f64; 3] = [0.15, 0.35, 0.7]; // normalized
const INPUT_TIMEOUT_MS: u64 = 100; // Reset speeds after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_BASE).await?;

    info!("Controls: WASD=strafe, Z/X=rotate, R/F=speed, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;

    // Persistent intent state; heading survives idle so wheels don't snap back
    let mut drive_angle = 0.0;
    let mut drive_speed = 0.0;
    let mut turn_speed = 0.0;
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Movement - point the wheels and refresh timestamp
                    KeyCode::Char(key @ ('w' | 'a' | 's' | 'd')) if pressed => {
                        drive_angle = heading(key);
                        drive_speed = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    // Rotation
                    KeyCode::Char('z') if pressed => {
                        turn_speed = TURN_SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('x') if pressed => {
                        turn_speed = -TURN_SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Zero speeds if no movement input for INPUT_TIMEOUT_MS
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            drive_speed = 0.0;
            turn_speed = 0.0;
        }

        // Always publish at ~50Hz
        let cmd = BaseCommand::DriveTurn {
            drive_angle,
            drive_speed,
            turn_speed,
        };
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}

/// Field-relative heading for a WASD key, radians counter-clockwise from forward
fn heading(key: char) -> f64 {
    match key {
        'a' => FRAC_PI_2,
        's' => PI,
        'd' => 3.0 * FRAC_PI_2,
        _ => 0.0,
    }
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
