// Module diagnostic: calibration and steering check on simulated modules
//
// Calibrates every module from its absolute encoder, prints the seeded
// angles, then steps the steering loop toward a target heading and reports
// how each wheel settles. Useful for sanity-checking a config file before it
// goes near a robot.
//
// Usage: cargo run --example module_diagnostic -- [config.json] [target_rad]
// Example: cargo run --example module_diagnostic -- swerve.json 1.57

use swerve_zenoh_runtime::config::SwerveConfig;
use swerve_zenoh_runtime::sim_drivetrain;
use swerve_zenoh_runtime::swerve::ModuleState;
use swerve_zenoh_runtime::swerve::angle::shortest_error;

const TICK_SECONDS: f64 = 0.02;
const TICKS: usize = 100;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SwerveConfig::load(&path)?,
        None => SwerveConfig::default(),
    };
    let target: f64 = match args.next() {
        Some(text) => text.parse()?,
        None => std::f64::consts::FRAC_PI_2,
    };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║            Swerve Module Diagnostic (SIMULATED)              ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut drivetrain = sim_drivetrain(&config);

    // ========== STEP 1: Calibrate ==========
    println!("Step 1: Calibrating from absolute encoders...");
    if let Err(e) = drivetrain.initialize() {
        println!("  ✗ {}", e);
    }
    for module in drivetrain.modules_mut() {
        let offset = module.config().calibration_offset;
        match module.absolute_angle() {
            Ok(angle) => println!(
                "  ✓ {:<12} offset {:>7.4} rad ({:.4} turns)  wheel {:>7.4} rad",
                module.name(),
                offset.radians(),
                offset.turns(),
                angle
            ),
            Err(e) => println!("  ✗ {:<12} {}", module.name(), e),
        }
    }
    println!();

    // ========== STEP 2: Steer ==========
    println!("Step 2: Steering to {:.4} rad for {} ticks...", target, TICKS);
    for _ in 0..TICKS {
        for module in drivetrain.modules_mut() {
            // Uncalibrated modules reject the command and are reported below
            if module.set_state(ModuleState::new(target, 0.0)).is_ok() {
                module.hardware_mut().angle.advance(TICK_SECONDS);
            }
        }
    }

    for module in drivetrain.modules_mut() {
        let angle = match module.wheel_angle() {
            Ok(angle) => angle,
            Err(e) => {
                println!("  ✗ {:<12} {}", module.name(), e);
                continue;
            }
        };
        let error = shortest_error(target, angle);
        let mark = if error.abs() < 0.01 { "✓" } else { "✗" };
        println!(
            "  {} {:<12} wheel {:>7.4} rad  error {:>+9.6} rad",
            mark,
            module.name(),
            angle,
            error
        );
    }

    drivetrain.stop()?;
    println!();
    println!("Done.");
    Ok(())
}
