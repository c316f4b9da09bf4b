use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reps::RepPhase;
use crate::setdown::DeviceState;

/// Every state change in the system produces an Event.
/// The CLI prints them; a GUI layer would poll for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Timer armed and listening for the phone to be set down.
    TimerArmed {
        target_ms: u64,
        at: DateTime<Utc>,
    },
    /// Device committed to stationary; countdown is running.
    /// Fired both on first start and on every resume after a pause.
    CountdownStarted {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Device moved while the countdown was running; elapsed time folded
    /// into the consumed total.
    CountdownPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Emitted at most once per session.
    CountdownCompleted {
        target_ms: u64,
        at: DateTime<Utc>,
    },
    TimerCancelled {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A full down-and-up motion cycle was counted.
    RepCounted {
        count: u32,
        at: DateTime<Utc>,
    },
    RepSessionReset {
        at: DateTime<Utc>,
    },
    /// The session wrapper observed the rep count reach the configured goal.
    RepGoalReached {
        count: u32,
        target_reps: u32,
        at: DateTime<Utc>,
    },
    /// Reward minutes were credited to the ledger.
    RewardGranted {
        minutes_added: u32,
        balance: u32,
        at: DateTime<Utc>,
    },
    TimerSnapshot {
        monitoring: bool,
        completed: bool,
        device_state: DeviceState,
        target_ms: u64,
        consumed_ms: u64,
        remaining_ms: u64,
        status: String,
        at: DateTime<Utc>,
    },
    RepSnapshot {
        count: u32,
        target_reps: u32,
        phase: RepPhase,
        baseline_deg: Option<f64>,
        status: String,
        at: DateTime<Utc>,
    },
}
