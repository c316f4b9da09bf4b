//! Replay recorded motion samples through a persisted detector.
//!
//! The input file is a JSON array of motion samples, the same shape the
//! `simulate` command emits with `--dump`. Replay mutates the persisted
//! detector state exactly as live sensor input would, including session
//! recording and reward grants on completion.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, ValueEnum};
use downtime_core::setdown::{KvSessionStore, SessionStore};
use downtime_core::storage::{Config, Database, SessionKind};
use downtime_core::{Event, MotionSample};

use super::{grant_reward, reps, timer};

#[derive(Clone, Copy, ValueEnum)]
pub enum DetectorKind {
    /// Set-down timer (stillness detection)
    Timer,
    /// Squat rep counter (pitch angle)
    Reps,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON file containing an array of motion samples
    #[arg(long)]
    pub file: PathBuf,
    /// Which detector to feed
    #[arg(long, value_enum, default_value = "timer")]
    pub detector: DetectorKind,
}

fn read_samples(path: &PathBuf) -> Result<Vec<MotionSample>, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let samples = read_samples(&args.file)?;
    let db = Database::open()?;
    let config = Config::load_or_default();

    match args.detector {
        DetectorKind::Timer => replay_timer(&db, &config, &samples),
        DetectorKind::Reps => replay_reps(&db, &config, &samples),
    }
}

fn replay_timer(
    db: &Database,
    config: &Config,
    samples: &[MotionSample],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = timer::load_timer(db, config);
    let mut completed = false;

    for sample in samples {
        if let Some(event) = engine.ingest(sample) {
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        if let Some(event) = engine.tick(sample.timestamp_ms) {
            println!("{}", serde_json::to_string_pretty(&event)?);
            completed = true;
        }
    }

    let mut store = KvSessionStore::new(db);
    store.save(&engine)?;
    if completed {
        let reward = timer::settle_completion(db, config, &engine)?;
        println!("{}", serde_json::to_string_pretty(&reward)?);
    }
    Ok(())
}

fn replay_reps(
    db: &Database,
    config: &Config,
    samples: &[MotionSample],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut detector = reps::load_detector(db, config);
    let already_done = detector.goal_reached();

    for sample in samples {
        if let Some(event) = detector.ingest(sample) {
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    reps::save_detector(db, &detector)?;
    if detector.goal_reached() && !already_done {
        let now = Utc::now();
        let goal = Event::RepGoalReached {
            count: detector.rep_count(),
            target_reps: detector.target_reps(),
            at: now,
        };
        println!("{}", serde_json::to_string_pretty(&goal)?);
        let minutes = config.rewards.minutes_per_exercise_session;
        db.record_session(
            SessionKind::Exercise,
            "Squats",
            u64::from(detector.target_reps()),
            u64::from(detector.rep_count()),
            minutes,
            now,
            now,
        )?;
        let reward = grant_reward(db, config.rewards.initial_minutes, minutes)?;
        println!("{}", serde_json::to_string_pretty(&reward)?);
    } else {
        let snapshot: Event = detector.snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
