//! Set-down timer engine.
//!
//! A wall-clock countdown that only advances while the device is physically
//! undisturbed. The engine is a state machine with no internal threads: the
//! caller feeds it motion samples as they arrive and invokes `tick()` on a
//! fixed short period while the countdown runs.
//!
//! ## Device states
//!
//! ```text
//! Moving -> Settling -> Stationary -> Moving
//! ```
//!
//! Entry to Stationary is debounced: acceleration magnitude must stay below
//! the entry threshold for a dwell window before the countdown starts. Exit
//! uses a separate, higher threshold so residual vibration while resting
//! does not flap the timer. Elapsed time is always recomputed from absolute
//! timestamps (`consumed_ms + (now - run_start)`), never from accumulating
//! per-tick deltas, so pause/resume cycles are lossless and immune to
//! scheduling jitter.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::motion::{MotionSample, MotionSnapshot};

/// Acceleration magnitude below which the device counts as at rest.
pub const STATIONARY_THRESHOLD: f64 = 0.12;

/// How long the magnitude must stay below the entry threshold before the
/// countdown commits to running.
pub const STATIONARY_DURATION_MS: u64 = 1200;

/// Magnitude above which a running countdown pauses. Deliberately higher
/// than the entry threshold (hysteresis).
pub const MOTION_END_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    /// Device in motion; countdown not running.
    Moving,
    /// Magnitude dropped below the entry threshold; waiting out the dwell
    /// window before committing to stationary.
    Settling,
    /// Device at rest; countdown running.
    Stationary,
}

/// Detection thresholds for the set-down timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDownConfig {
    pub stationary_threshold: f64,
    pub stationary_duration_ms: u64,
    pub motion_end_threshold: f64,
}

impl Default for SetDownConfig {
    fn default() -> Self {
        Self {
            stationary_threshold: STATIONARY_THRESHOLD,
            stationary_duration_ms: STATIONARY_DURATION_MS,
            motion_end_threshold: MOTION_END_THRESHOLD,
        }
    }
}

/// Core set-down timer state machine.
///
/// Serializable so in-flight sessions can be rehydrated across a view
/// teardown via a [`super::SessionStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDownTimer {
    config: SetDownConfig,
    /// Configured countdown length. Valid sessions have `target_ms > 0`.
    target_ms: u64,
    /// Elapsed time accumulated across pause/resume cycles.
    consumed_ms: u64,
    /// Set while the countdown is actively running, cleared on pause.
    run_start_ms: Option<u64>,
    device_state: DeviceState,
    /// When the settling dwell window began.
    stationary_since: Option<u64>,
    /// True from `arm` until cancel/completion.
    monitoring: bool,
    /// Latch: the completion signal fires at most once per session, no
    /// matter how many samples or ticks arrive afterwards.
    completed: bool,
    /// True once the countdown has started at least once this session.
    session_started: bool,
    /// Reading captured when the device committed to stationary (display).
    baseline: Option<MotionSnapshot>,
}

impl SetDownTimer {
    pub fn new(config: SetDownConfig) -> Self {
        Self {
            config,
            target_ms: 0,
            consumed_ms: 0,
            run_start_ms: None,
            device_state: DeviceState::Moving,
            stationary_since: None,
            monitoring: false,
            completed: false,
            session_started: false,
            baseline: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn target_ms(&self) -> u64 {
        self.target_ms
    }

    pub fn consumed_ms(&self) -> u64 {
        self.consumed_ms
    }

    pub fn device_state(&self) -> DeviceState {
        self.device_state
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn baseline(&self) -> Option<&MotionSnapshot> {
        self.baseline.as_ref()
    }

    /// Remaining countdown time at `now_ms`, from absolute timestamps.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .run_start_ms
            .map_or(0, |start| now_ms.saturating_sub(start));
        self.target_ms
            .saturating_sub(self.consumed_ms)
            .saturating_sub(running)
    }

    pub fn status_message(&self) -> String {
        if self.completed {
            return "Session complete! Tap start to run it again.".to_string();
        }
        if !self.monitoring {
            return "Tap start to arm the timer.".to_string();
        }
        match self.device_state {
            DeviceState::Stationary => "Countdown running... keep the phone down.".to_string(),
            DeviceState::Settling => "Hold still for a moment...".to_string(),
            DeviceState::Moving if self.session_started => {
                "Phone picked up, timer paused. Set it down to resume.".to_string()
            }
            DeviceState::Moving => "Set the phone down to start the countdown.".to_string(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        Event::TimerSnapshot {
            monitoring: self.monitoring,
            completed: self.completed,
            device_state: self.device_state,
            target_ms: self.target_ms,
            consumed_ms: self.consumed_ms,
            remaining_ms: self.remaining_ms(now_ms),
            status: self.status_message(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the timer with a countdown length.
    ///
    /// Rejects a zero duration without touching any session state; the
    /// caller surfaces the message and keeps whatever was armed before.
    pub fn arm(&mut self, target_ms: u64) -> Result<Event, ValidationError> {
        if target_ms == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        self.target_ms = target_ms;
        self.consumed_ms = 0;
        self.run_start_ms = None;
        self.device_state = DeviceState::Moving;
        self.stationary_since = None;
        self.monitoring = true;
        self.completed = false;
        self.session_started = false;
        self.baseline = None;
        Ok(Event::TimerArmed {
            target_ms,
            at: Utc::now(),
        })
    }

    /// Feed one motion sample through the device-state machine.
    ///
    /// Returns the started/resumed or paused event on a committed
    /// transition. Samples arriving outside an active session (or after
    /// completion) are ignored.
    pub fn ingest(&mut self, sample: &MotionSample) -> Option<Event> {
        if !self.monitoring || self.completed {
            return None;
        }
        let magnitude = sample.magnitude();
        let now = sample.timestamp_ms;

        match self.device_state {
            DeviceState::Moving | DeviceState::Settling => {
                if magnitude < self.config.stationary_threshold {
                    match self.stationary_since {
                        None => {
                            // Debounce window opens; commit happens on a
                            // later sample once the dwell time has passed.
                            self.stationary_since = Some(now);
                            self.device_state = DeviceState::Settling;
                            None
                        }
                        Some(since)
                            if now.saturating_sub(since)
                                >= self.config.stationary_duration_ms =>
                        {
                            self.commit_stationary(sample)
                        }
                        Some(_) => None,
                    }
                } else {
                    // Any motion before the dwell elapses restarts the
                    // debounce from zero.
                    self.stationary_since = None;
                    self.device_state = DeviceState::Moving;
                    None
                }
            }
            DeviceState::Stationary => {
                if magnitude > self.config.motion_end_threshold {
                    Some(self.pause(now))
                } else {
                    None
                }
            }
        }
    }

    /// Periodic countdown update while stationary.
    ///
    /// Returns `Some(Event::CountdownCompleted)` exactly once, when the
    /// remaining time reaches zero.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if !self.monitoring || self.completed || self.run_start_ms.is_none() {
            return None;
        }
        if self.remaining_ms(now_ms) > 0 {
            return None;
        }
        self.consumed_ms = self.target_ms;
        self.run_start_ms = None;
        self.stationary_since = None;
        self.device_state = DeviceState::Moving;
        self.monitoring = false;
        self.completed = true;
        Some(Event::CountdownCompleted {
            target_ms: self.target_ms,
            at: Utc::now(),
        })
    }

    /// App backgrounding / view teardown while the countdown runs.
    ///
    /// Treated identically to motion: pause and fold elapsed time, so the
    /// countdown can never silently complete while unobserved.
    pub fn interrupt(&mut self, now_ms: u64) -> Option<Event> {
        if !self.monitoring || self.completed {
            return None;
        }
        if self.device_state != DeviceState::Stationary {
            return None;
        }
        Some(self.pause(now_ms))
    }

    /// Stop the session, folding any running elapsed time.
    pub fn cancel(&mut self, now_ms: u64) -> Option<Event> {
        if !self.monitoring {
            return None;
        }
        self.fold_elapsed(now_ms);
        self.monitoring = false;
        self.stationary_since = None;
        self.device_state = DeviceState::Moving;
        self.session_started = false;
        Some(Event::TimerCancelled {
            remaining_ms: self.remaining_ms(now_ms),
            at: Utc::now(),
        })
    }

    /// Return to the initial state, keeping only the configured target.
    pub fn reset(&mut self) -> Event {
        self.consumed_ms = 0;
        self.run_start_ms = None;
        self.device_state = DeviceState::Moving;
        self.stationary_since = None;
        self.monitoring = false;
        self.completed = false;
        self.session_started = false;
        self.baseline = None;
        Event::TimerReset { at: Utc::now() }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn commit_stationary(&mut self, sample: &MotionSample) -> Option<Event> {
        let now = sample.timestamp_ms;
        self.run_start_ms = Some(now);
        self.stationary_since = None;
        self.device_state = DeviceState::Stationary;
        self.session_started = true;
        self.baseline = Some(MotionSnapshot::capture(sample));
        Some(Event::CountdownStarted {
            remaining_ms: self.remaining_ms(now),
            at: Utc::now(),
        })
    }

    fn pause(&mut self, now_ms: u64) -> Event {
        self.fold_elapsed(now_ms);
        self.device_state = DeviceState::Moving;
        self.stationary_since = None;
        Event::CountdownPaused {
            remaining_ms: self.remaining_ms(now_ms),
            at: Utc::now(),
        }
    }

    fn fold_elapsed(&mut self, now_ms: u64) {
        if let Some(start) = self.run_start_ms.take() {
            let elapsed = now_ms.saturating_sub(start);
            self.consumed_ms = (self.consumed_ms + elapsed).min(self.target_ms);
        }
    }
}

impl Default for SetDownTimer {
    fn default() -> Self {
        Self::new(SetDownConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::MotionSample;
    use proptest::prelude::*;

    fn mag(t: u64, m: f64) -> MotionSample {
        MotionSample::from_magnitude(t, m)
    }

    fn timer_with_dwell(dwell_ms: u64) -> SetDownTimer {
        SetDownTimer::new(SetDownConfig {
            stationary_duration_ms: dwell_ms,
            ..SetDownConfig::default()
        })
    }

    /// Feed still samples from `start` until the timer commits to
    /// Stationary; returns the commit timestamp (the countdown run start).
    fn settle(timer: &mut SetDownTimer, start: u64) -> u64 {
        let mut t = start;
        loop {
            timer.ingest(&mag(t, 0.05));
            if timer.device_state() == DeviceState::Stationary {
                return t;
            }
            t += 100;
        }
    }

    #[test]
    fn arm_rejects_zero_duration() {
        // A rejected arm must leave the running session untouched.
        let mut timer = SetDownTimer::default();
        timer.arm(5_000).unwrap();
        let start = settle(&mut timer, 0);

        let before = timer.remaining_ms(start + 100);
        assert!(timer.arm(0).is_err());
        assert_eq!(timer.remaining_ms(start + 100), before);
        assert!(timer.is_monitoring());
        assert_eq!(timer.device_state(), DeviceState::Stationary);
    }

    #[test]
    fn countdown_starts_only_after_dwell() {
        // Dwell 500 ms, samples every 50 ms at 0.05.
        let mut timer = timer_with_dwell(500);
        timer.arm(2_000).unwrap();

        let mut started_at = None;
        for i in 0..=10u64 {
            let t = i * 50;
            if let Some(Event::CountdownStarted { .. }) = timer.ingest(&mag(t, 0.05)) {
                started_at = Some(t);
            }
            if t < 500 {
                assert_ne!(timer.device_state(), DeviceState::Stationary);
            }
        }
        assert_eq!(started_at, Some(500));
    }

    #[test]
    fn motion_during_settling_restarts_debounce() {
        let mut timer = timer_with_dwell(500);
        timer.arm(2_000).unwrap();

        timer.ingest(&mag(0, 0.05));
        assert_eq!(timer.device_state(), DeviceState::Settling);
        timer.ingest(&mag(200, 0.3));
        assert_eq!(timer.device_state(), DeviceState::Moving);

        // 500 ms from the bump is not enough; the window restarted.
        timer.ingest(&mag(250, 0.05));
        timer.ingest(&mag(500, 0.05));
        assert_eq!(timer.device_state(), DeviceState::Settling);
        // Commits once the fresh window has fully elapsed.
        let event = timer.ingest(&mag(750, 0.05));
        assert!(matches!(event, Some(Event::CountdownStarted { .. })));
    }

    #[test]
    fn residual_vibration_below_exit_threshold_keeps_running() {
        // Entry is 0.12 but exit is 0.7: a 0.3 bump while resting must not
        // pause the countdown.
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);

        assert!(timer.ingest(&mag(start + 700, 0.3)).is_none());
        assert_eq!(timer.device_state(), DeviceState::Stationary);
    }

    #[test]
    fn pickup_pauses_and_folds_elapsed() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);

        let event = timer.ingest(&mag(start + 3_000, 1.2));
        assert!(matches!(event, Some(Event::CountdownPaused { .. })));
        assert_eq!(timer.device_state(), DeviceState::Moving);
        assert_eq!(timer.consumed_ms(), 3_000);
        assert_eq!(timer.remaining_ms(start + 10_000), 57_000);
    }

    #[test]
    fn remaining_is_constant_while_paused() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);
        timer.ingest(&mag(start + 1_000, 1.2));

        let r1 = timer.remaining_ms(start + 2_000);
        let r2 = timer.remaining_ms(start + 30_000);
        assert_eq!(r1, 59_000);
        assert_eq!(r1, r2);
    }

    #[test]
    fn pause_resume_is_lossless() {
        // Arbitrary pause/resume cycles yield the same total
        // as one uninterrupted run of the cumulative stationary duration.
        let mut timer = SetDownTimer::default();
        timer.arm(10_000).unwrap();

        let start = settle(&mut timer, 0);
        timer.ingest(&mag(start + 3_000, 1.0));
        let resume = settle(&mut timer, start + 5_000);
        timer.ingest(&mag(resume + 4_000, 1.0));
        assert_eq!(timer.consumed_ms(), 7_000);
        assert_eq!(timer.remaining_ms(resume + 10_000), 3_000);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut timer = SetDownTimer::default();
        timer.arm(2_000).unwrap();
        let start = settle(&mut timer, 0);

        assert!(timer.tick(start + 1_900).is_none());
        let done = timer.tick(start + 2_100);
        assert!(matches!(done, Some(Event::CountdownCompleted { .. })));
        assert_eq!(timer.consumed_ms(), 2_000);

        // Late ticks and samples after the completing one are inert.
        assert!(timer.tick(start + 2_200).is_none());
        assert!(timer.ingest(&mag(start + 2_300, 1.5)).is_none());
        assert!(timer.ingest(&mag(start + 2_400, 0.01)).is_none());
        assert_eq!(timer.consumed_ms(), 2_000);
        assert!(timer.is_completed());
    }

    #[test]
    fn interrupt_acts_like_pickup() {
        // App backgrounding must pause rather than let the countdown
        // complete unobserved.
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);

        let event = timer.interrupt(start + 4_000);
        assert!(matches!(event, Some(Event::CountdownPaused { .. })));
        assert_eq!(timer.consumed_ms(), 4_000);
        assert_eq!(timer.device_state(), DeviceState::Moving);
        // No countdown is running, so no tick can complete it.
        assert!(timer.tick(500_000).is_none());
    }

    #[test]
    fn interrupt_while_not_running_is_noop() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        assert!(timer.interrupt(1_000).is_none());
        assert_eq!(timer.consumed_ms(), 0);
    }

    #[test]
    fn cancel_folds_running_time_and_stops() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);

        let event = timer.cancel(start + 1_000);
        assert!(matches!(event, Some(Event::TimerCancelled { .. })));
        assert!(!timer.is_monitoring());
        assert_eq!(timer.consumed_ms(), 1_000);
        // Further samples are ignored after cancel.
        assert!(timer.ingest(&mag(start + 2_000, 0.01)).is_none());
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);
        timer.ingest(&mag(start + 1_000, 1.0));

        timer.reset();
        assert_eq!(timer.consumed_ms(), 0);
        assert_eq!(timer.device_state(), DeviceState::Moving);
        assert!(!timer.is_monitoring());
        assert!(timer.baseline().is_none());
        assert_eq!(timer.remaining_ms(5_000), 60_000);
    }

    #[test]
    fn baseline_snapshot_captured_on_commit() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        assert!(timer.baseline().is_none());
        settle(&mut timer, 0);
        assert!(timer.baseline().is_some());
    }

    #[test]
    fn inert_without_samples() {
        // A silent sensor means no transitions and no error.
        let mut timer = SetDownTimer::default();
        timer.arm(2_000).unwrap();
        assert!(timer.tick(10_000).is_none());
        assert_eq!(timer.device_state(), DeviceState::Moving);
        assert!(!timer.is_completed());
    }

    #[test]
    fn serde_roundtrip_preserves_session() {
        let mut timer = SetDownTimer::default();
        timer.arm(60_000).unwrap();
        let start = settle(&mut timer, 0);
        timer.ingest(&mag(start + 1_000, 1.0));

        let json = serde_json::to_string(&timer).unwrap();
        let back: SetDownTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.consumed_ms(), timer.consumed_ms());
        assert_eq!(back.device_state(), timer.device_state());
        assert_eq!(back.target_ms(), timer.target_ms());
    }

    proptest! {
        /// Remaining time never increases while the countdown runs.
        #[test]
        fn remaining_is_monotonic_while_stationary(
            offsets in proptest::collection::vec(1u64..5_000, 1..20)
        ) {
            let mut timer = SetDownTimer::default();
            timer.arm(600_000).unwrap();
            let mut t = 0;
            while timer.device_state() != DeviceState::Stationary {
                timer.ingest(&mag(t, 0.05));
                t += 100;
            }
            let mut prev = timer.remaining_ms(t);
            for offset in offsets {
                t += offset;
                timer.tick(t);
                let next = timer.remaining_ms(t);
                prop_assert!(next <= prev);
                prev = next;
            }
        }

        /// Any number of pause/resume cycles accumulates exactly the sum of
        /// the stationary stretches.
        #[test]
        fn accumulation_is_lossless(
            runs in proptest::collection::vec(100u64..10_000, 1..10)
        ) {
            let total: u64 = runs.iter().sum();
            let target = total + 1;
            let mut timer = SetDownTimer::default();
            timer.arm(target).unwrap();

            let mut t = 0;
            for run in &runs {
                // Settle (dwell samples), run for `run` ms, then pick up.
                loop {
                    timer.ingest(&mag(t, 0.05));
                    if timer.device_state() == DeviceState::Stationary {
                        break;
                    }
                    t += 100;
                }
                t += run;
                timer.ingest(&mag(t, 1.5));
                t += 500;
            }
            prop_assert_eq!(timer.consumed_ms(), total);
        }
    }
}
