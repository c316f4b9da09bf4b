use chrono::{DateTime, Utc};
use clap::Subcommand;
use downtime_core::setdown::{KvSessionStore, SessionStore, SetDownTimer};
use downtime_core::storage::{Config, Database, SessionKind};
use downtime_core::Event;

use super::{grant_reward, now_ms};

const ARMED_AT_KEY: &str = "setdown_armed_at";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Arm the timer and start watching for the phone to be set down
    Arm {
        /// Countdown duration in seconds (default from config)
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Tick the timer and print its state as JSON
    Status,
    /// Pause the countdown (device picked up / app backgrounded)
    Pause,
    /// Cancel the session, keeping partial progress in the output
    Cancel,
    /// Reset to idle state
    Reset,
}

pub(crate) fn load_timer(db: &Database, config: &Config) -> SetDownTimer {
    let store = KvSessionStore::new(db);
    match store.load() {
        Ok(Some(timer)) => timer,
        _ => SetDownTimer::new(config.setdown_config()),
    }
}

/// Record the completed focus session and credit its reward minutes.
pub(crate) fn settle_completion(
    db: &Database,
    config: &Config,
    timer: &SetDownTimer,
) -> Result<Event, Box<dyn std::error::Error>> {
    let completed_at = Utc::now();
    let started_at = db
        .kv_get(ARMED_AT_KEY)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(completed_at);
    let minutes = config.rewards.minutes_per_focus_session;
    db.record_session(
        SessionKind::Focus,
        "Focus session",
        timer.target_ms(),
        timer.consumed_ms(),
        minutes,
        started_at,
        completed_at,
    )?;
    db.kv_delete(ARMED_AT_KEY)?;
    grant_reward(db, config.rewards.initial_minutes, minutes)
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut timer = load_timer(&db, &config);

    match action {
        TimerAction::Arm { duration_secs } => {
            let secs = duration_secs.unwrap_or(config.timer.default_duration_secs);
            let event = timer.arm(secs * 1000)?;
            db.kv_set(ARMED_AT_KEY, &Utc::now().to_rfc3339())?;
            let mut store = KvSessionStore::new(&db);
            store.save(&timer)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Status => {
            let completed = timer.tick(now_ms());
            let mut store = KvSessionStore::new(&db);
            store.save(&timer)?;
            let snapshot = timer.snapshot(now_ms());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            if let Some(event @ Event::CountdownCompleted { .. }) = completed {
                println!("{}", serde_json::to_string_pretty(&event)?);
                let reward = settle_completion(&db, &config, &timer)?;
                println!("{}", serde_json::to_string_pretty(&reward)?);
            }
        }
        TimerAction::Pause => {
            if let Some(event) = timer.interrupt(now_ms()) {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&timer.snapshot(now_ms()))?);
            }
            let mut store = KvSessionStore::new(&db);
            store.save(&timer)?;
        }
        TimerAction::Cancel => {
            if let Some(event) = timer.cancel(now_ms()) {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&timer.snapshot(now_ms()))?);
            }
            let mut store = KvSessionStore::new(&db);
            store.clear()?;
            db.kv_delete(ARMED_AT_KEY)?;
        }
        TimerAction::Reset => {
            let event = timer.reset();
            let mut store = KvSessionStore::new(&db);
            store.clear()?;
            db.kv_delete(ARMED_AT_KEY)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    Ok(())
}
