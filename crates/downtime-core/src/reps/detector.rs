//! Repetition detector.
//!
//! Converts a noisy pitch-angle stream into discrete, debounced repetition
//! counts with a two-state phase machine:
//!
//! ```text
//! Ready -> Down -> Ready   (one rep counted on the Down -> Ready edge)
//! ```
//!
//! The detector calibrates a baseline angle from the first sample of a
//! session and derives two asymmetric thresholds from it (hysteresis), so
//! sensor jitter at a single boundary cannot register spurious reps. A
//! minimum inter-rep interval additionally rejects double counting from
//! noise within one physical repetition.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::motion::MotionSample;

/// How far below the baseline the angle must fall to enter the Down phase
/// (degrees).
pub const DOWN_DELTA_DEG: f64 = 18.0;

/// How far below the baseline the angle must rise back above to complete a
/// rep (degrees). Smaller than [`DOWN_DELTA_DEG`] so the two thresholds
/// straddle the motion instead of sharing one boundary.
pub const UP_DELTA_DEG: f64 = 8.0;

/// Minimum spacing between counted reps.
pub const MIN_REP_INTERVAL_MS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepPhase {
    /// Standing / top of the motion.
    Ready,
    /// Past the down threshold, waiting for the return.
    Down,
}

/// Detector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepDetectorConfig {
    pub down_delta_deg: f64,
    pub up_delta_deg: f64,
    pub min_rep_interval_ms: u64,
    /// When set, calibration pins the baseline to this angle instead of the
    /// first sample's pitch. Recovers the fixed-absolute-threshold design
    /// with a value such as -20.0.
    #[serde(default)]
    pub fixed_baseline_deg: Option<f64>,
}

impl Default for RepDetectorConfig {
    fn default() -> Self {
        Self {
            down_delta_deg: DOWN_DELTA_DEG,
            up_delta_deg: UP_DELTA_DEG,
            min_rep_interval_ms: MIN_REP_INTERVAL_MS,
            fixed_baseline_deg: None,
        }
    }
}

impl RepDetectorConfig {
    pub fn with_fixed_baseline(mut self, baseline_deg: f64) -> Self {
        self.fixed_baseline_deg = Some(baseline_deg);
        self
    }
}

/// Rep-counting session state.
///
/// Created when tracking starts, reset when tracking stops or the user
/// resets. The detector has no concept of "done": goal completion is
/// `rep_count() >= target_reps()`, evaluated by the caller after each
/// ingest (a target of 0 means uncapped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepDetector {
    config: RepDetectorConfig,
    target_reps: u32,
    rep_count: u32,
    phase: RepPhase,
    baseline_deg: Option<f64>,
    last_rep_ms: Option<u64>,
}

impl RepDetector {
    pub fn new(config: RepDetectorConfig, target_reps: u32) -> Self {
        Self {
            config,
            target_reps,
            rep_count: 0,
            phase: RepPhase::Ready,
            baseline_deg: None,
            last_rep_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn target_reps(&self) -> u32 {
        self.target_reps
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn baseline_deg(&self) -> Option<f64> {
        self.baseline_deg
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline_deg.is_some()
    }

    /// Pure helper for the caller's session-end check.
    pub fn goal_reached(&self) -> bool {
        self.target_reps > 0 && self.rep_count >= self.target_reps
    }

    pub fn status_message(&self) -> String {
        if !self.is_calibrated() {
            "Hold the phone steady to calibrate.".to_string()
        } else {
            match self.phase {
                RepPhase::Down => "Going down...".to_string(),
                RepPhase::Ready => "Ready for rep!".to_string(),
            }
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::RepSnapshot {
            count: self.rep_count,
            target_reps: self.target_reps,
            phase: self.phase,
            baseline_deg: self.baseline_deg,
            status: self.status_message(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Capture the calibration baseline from this sample and return the
    /// phase to Ready. Normally invoked implicitly by the first `ingest`
    /// of a session.
    pub fn calibrate(&mut self, sample: &MotionSample) {
        let baseline = self
            .config
            .fixed_baseline_deg
            .unwrap_or_else(|| sample.rotation.pitch_degrees());
        self.baseline_deg = Some(baseline);
        self.phase = RepPhase::Ready;
    }

    /// Feed one sample through the phase machine.
    ///
    /// Returns `Some(Event::RepCounted)` on a counted Down -> Ready edge.
    /// A call before calibration is the calibration call, never a phase
    /// transition.
    pub fn ingest(&mut self, sample: &MotionSample) -> Option<Event> {
        let Some(baseline) = self.baseline_deg else {
            self.calibrate(sample);
            return None;
        };

        let angle = sample.rotation.pitch_degrees();
        let now = sample.timestamp_ms;
        let down_threshold = baseline - self.config.down_delta_deg;
        let up_threshold = baseline - self.config.up_delta_deg;

        match self.phase {
            RepPhase::Ready => {
                if angle < down_threshold {
                    self.phase = RepPhase::Down;
                }
                None
            }
            RepPhase::Down => {
                if angle <= up_threshold {
                    return None;
                }
                // The up-transition is deferred, not dropped, while inside
                // the minimum interval: a later sample that still satisfies
                // the angle condition completes the rep.
                let interval_ok = self
                    .last_rep_ms
                    .map_or(true, |t| now.saturating_sub(t) > self.config.min_rep_interval_ms);
                if !interval_ok {
                    return None;
                }
                self.phase = RepPhase::Ready;
                self.rep_count += 1;
                self.last_rep_ms = Some(now);
                Some(Event::RepCounted {
                    count: self.rep_count,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Return to the initial state: count 0, phase Ready, baseline cleared.
    pub fn reset(&mut self) -> Event {
        self.rep_count = 0;
        self.phase = RepPhase::Ready;
        self.baseline_deg = None;
        self.last_rep_ms = None;
        Event::RepSessionReset { at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> RepDetector {
        RepDetector::new(RepDetectorConfig::default(), 0)
    }

    fn angle(t: u64, deg: f64) -> MotionSample {
        MotionSample::from_pitch_deg(t, deg)
    }

    fn feed(det: &mut RepDetector, samples: &[(u64, f64)]) -> u32 {
        for &(t, deg) in samples {
            det.ingest(&angle(t, deg));
        }
        det.rep_count()
    }

    #[test]
    fn first_sample_calibrates_instead_of_transitioning() {
        let mut det = detector();
        // Way below any threshold, but it is the calibration sample.
        assert!(det.ingest(&angle(0, -40.0)).is_none());
        assert_eq!(det.baseline_deg(), Some(-40.0));
        assert_eq!(det.phase(), RepPhase::Ready);
        assert_eq!(det.rep_count(), 0);
    }

    #[test]
    fn one_down_up_cycle_counts_one_rep() {
        // Baseline 0, dip to -20, back to 0.
        let mut det = detector();
        let count = feed(&mut det, &[(0, 0.0), (100, -20.0), (200, -20.0), (300, 0.0)]);
        assert_eq!(count, 1);
        assert_eq!(det.phase(), RepPhase::Ready);
    }

    #[test]
    fn second_cycle_within_min_interval_is_deferred() {
        // A second identical cycle inside 600 ms of the
        // first rep must not count until the interval has elapsed.
        let mut det = detector();
        feed(&mut det, &[(0, 0.0), (100, -20.0), (200, -20.0), (300, 0.0)]);
        assert_eq!(det.rep_count(), 1);

        feed(&mut det, &[(350, -20.0), (500, -20.0), (650, 0.0)]);
        // 650 - 300 = 350 <= 600: deferred, still in Down.
        assert_eq!(det.rep_count(), 1);
        assert_eq!(det.phase(), RepPhase::Down);

        // A later confirming sample past the interval completes the rep.
        det.ingest(&angle(950, 0.0));
        assert_eq!(det.rep_count(), 2);
    }

    #[test]
    fn jitter_between_thresholds_does_not_oscillate() {
        // Between up (-8) and down (-18) thresholds nothing transitions.
        let mut det = detector();
        feed(
            &mut det,
            &[(0, 0.0), (100, -12.0), (200, -15.0), (300, -10.0), (400, -13.0)],
        );
        assert_eq!(det.rep_count(), 0);
        assert_eq!(det.phase(), RepPhase::Ready);
    }

    #[test]
    fn partial_dip_does_not_count() {
        let mut det = detector();
        feed(&mut det, &[(0, 0.0), (100, -15.0), (200, 0.0)]);
        assert_eq!(det.rep_count(), 0);
    }

    #[test]
    fn spaced_cycles_count_one_each() {
        // One rep per down->up cycle when spacing clears the
        // minimum interval.
        let mut det = detector();
        let mut samples = vec![(0, 0.0)];
        for i in 0..5u64 {
            let base = 100 + i * 1400;
            samples.push((base, -25.0));
            samples.push((base + 700, 0.0));
        }
        feed(&mut det, &samples);
        assert_eq!(det.rep_count(), 5);
    }

    #[test]
    fn calibration_tolerates_carry_position() {
        // Same motion relative to a different baseline still counts.
        let mut det = detector();
        feed(&mut det, &[(0, 30.0), (100, 8.0), (200, 8.0), (300, 30.0)]);
        assert_eq!(det.rep_count(), 1);
    }

    #[test]
    fn fixed_baseline_variant() {
        let config = RepDetectorConfig::default().with_fixed_baseline(-20.0);
        let mut det = RepDetector::new(config, 0);
        // Calibration sample at some unrelated angle pins baseline to -20.
        det.ingest(&angle(0, 5.0));
        assert_eq!(det.baseline_deg(), Some(-20.0));
        feed(&mut det, &[(100, -45.0), (800, -20.0)]);
        assert_eq!(det.rep_count(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut det = detector();
        feed(&mut det, &[(0, 0.0), (100, -20.0), (700, 0.0)]);
        assert_eq!(det.rep_count(), 1);
        det.reset();
        assert_eq!(det.rep_count(), 0);
        assert_eq!(det.phase(), RepPhase::Ready);
        assert!(det.baseline_deg().is_none());
        // Next sample calibrates again.
        assert!(det.ingest(&angle(800, -20.0)).is_none());
        assert_eq!(det.baseline_deg(), Some(-20.0));
    }

    #[test]
    fn goal_reached_is_callers_concern() {
        let mut det = RepDetector::new(RepDetectorConfig::default(), 2);
        assert!(!det.goal_reached());
        feed(&mut det, &[(0, 0.0), (100, -20.0), (700, 0.0)]);
        assert!(!det.goal_reached());
        feed(&mut det, &[(1400, -20.0), (2100, 0.0)]);
        assert_eq!(det.rep_count(), 2);
        assert!(det.goal_reached());
        // Counting continues past the goal; the detector never stops itself.
        feed(&mut det, &[(2800, -20.0), (3500, 0.0)]);
        assert_eq!(det.rep_count(), 3);
    }

    #[test]
    fn uncapped_target_never_reports_goal() {
        let mut det = detector();
        feed(&mut det, &[(0, 0.0), (100, -20.0), (700, 0.0)]);
        assert!(!det.goal_reached());
    }
}
