use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use swerve_zenoh_runtime::config::{CMD_TIMEOUT, LOOP_HZ, SwerveConfig, TOPIC_CMD_BASE};
use swerve_zenoh_runtime::runtime::{self, RuntimeOptions};
use swerve_zenoh_runtime::sim_drivetrain;

/// Swerve drive runtime: zenoh commands in, module commands out
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON module configuration (defaults to the built-in calibration)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command key expression
    #[arg(long, default_value = TOPIC_CMD_BASE)]
    topic: String,

    /// Control loop rate, 1 to 1000 Hz
    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=1000))]
    loop_hz: u64,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SwerveConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error ({}): {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => SwerveConfig::default(),
    };
    info!("Loaded {} module configs", config.modules.len());

    let options = RuntimeOptions {
        loop_hz: args.loop_hz,
        cmd_timeout: CMD_TIMEOUT,
        topic: args.topic,
    };

    // No vendor drivers are linked in; run against simulated modules
    let drivetrain = sim_drivetrain(&config);
    let result = runtime::run(options, drivetrain, |drivetrain, period| {
        let dt = period.as_secs_f64();
        for module in drivetrain.modules_mut() {
            let hardware = module.hardware_mut();
            hardware.drive.advance(dt);
            hardware.angle.advance(dt);
        }
    })
    .await;

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
