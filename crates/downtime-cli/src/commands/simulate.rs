//! Seeded synthetic motion streams fed through in-memory detectors.
//!
//! Nothing here touches the database; the detectors run fresh and the
//! resulting event stream goes to stdout. With `--dump` the raw sample
//! array is written to a file instead, in the format `replay --file`
//! accepts.

use std::path::PathBuf;

use clap::Subcommand;
use downtime_core::motion::sim::{self, SimConfig};
use downtime_core::storage::Config;
use downtime_core::{MotionSample, RepDetector, SetDownTimer};

#[derive(Subcommand)]
pub enum SimulateAction {
    /// A focus session: settle, rest, then a pickup burst
    Focus {
        /// Countdown target in seconds
        #[arg(long, default_value = "3")]
        target_secs: u64,
        /// How long the phone rests before the pickup, in seconds
        #[arg(long, default_value = "6")]
        rest_secs: u64,
        /// Random seed for a reproducible stream
        #[arg(long)]
        seed: Option<u64>,
        /// Write the sample array to this file instead of running the timer
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// A series of squat cycles
    Squats {
        /// Number of squat cycles to generate
        #[arg(long, default_value = "5")]
        reps: usize,
        /// Standing pitch angle in degrees
        #[arg(long, default_value = "35.0")]
        baseline: f64,
        /// Dip depth below the baseline in degrees
        #[arg(long, default_value = "25.0")]
        dip: f64,
        /// Rep goal for the in-memory session
        #[arg(long)]
        goal: Option<u32>,
        /// Random seed for a reproducible stream
        #[arg(long)]
        seed: Option<u64>,
        /// Write the sample array to this file instead of counting reps
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

fn dump_samples(
    path: &PathBuf,
    samples: &[MotionSample],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_string_pretty(samples)?)?;
    println!("wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

pub fn run(action: SimulateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        SimulateAction::Focus {
            target_secs,
            rest_secs,
            seed,
            dump,
        } => {
            let sim_config = SimConfig {
                interval_ms: config.timer.sample_interval_ms,
                seed,
                ..SimConfig::default()
            };
            let samples = sim::focus_profile(&sim_config, rest_secs * 1000);
            if let Some(path) = dump {
                return dump_samples(&path, &samples);
            }

            let mut timer = SetDownTimer::new(config.setdown_config());
            let event = timer.arm(target_secs * 1000)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            for sample in &samples {
                if let Some(event) = timer.ingest(sample) {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                if let Some(event) = timer.tick(sample.timestamp_ms) {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
            }
            let last = samples.last().map_or(0, |s| s.timestamp_ms);
            println!("{}", serde_json::to_string_pretty(&timer.snapshot(last))?);
        }
        SimulateAction::Squats {
            reps,
            baseline,
            dip,
            goal,
            seed,
            dump,
        } => {
            let sim_config = SimConfig {
                interval_ms: config.reps.sample_interval_ms,
                seed,
                ..SimConfig::default()
            };
            let samples = sim::squat_stream(&sim_config, baseline, dip, reps);
            if let Some(path) = dump {
                return dump_samples(&path, &samples);
            }

            let goal = goal.unwrap_or(config.reps.default_goal);
            let mut detector = RepDetector::new(config.rep_config(), goal);
            for sample in &samples {
                if let Some(event) = detector.ingest(sample) {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&detector.snapshot())?);
        }
    }

    Ok(())
}
