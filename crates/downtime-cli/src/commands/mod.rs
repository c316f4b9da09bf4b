pub mod config;
pub mod ledger;
pub mod replay;
pub mod reps;
pub mod simulate;
pub mod stats;
pub mod timer;

use chrono::Utc;
use downtime_core::storage::Database;
use downtime_core::{Event, RewardLedger};

/// Current wall-clock time as milliseconds since the Unix epoch, the
/// timestamp domain the detectors operate in.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Credit `minutes` to the persisted reward balance and return the
/// grant event.
pub fn grant_reward(
    db: &Database,
    initial_minutes: u32,
    minutes: u32,
) -> Result<Event, Box<dyn std::error::Error>> {
    let mut ledger = RewardLedger::new(db.reward_minutes(initial_minutes)?);
    let balance = ledger.add_minutes(i64::from(minutes));
    db.set_reward_minutes(balance)?;
    Ok(Event::RewardGranted {
        minutes_added: minutes,
        balance,
        at: Utc::now(),
    })
}
