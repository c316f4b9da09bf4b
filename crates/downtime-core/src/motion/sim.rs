//! Synthetic motion stream generation.
//!
//! Produces deterministic, seeded sample sequences that look like real
//! device motion: a phone resting on a desk, a pickup burst, or a series of
//! squat cycles. Used by the CLI `simulate` command and by tests that want
//! realistic (noisy) input rather than hand-written sequences.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::motion::{MotionSample, Rotation, Vec3};

/// Configuration for synthetic stream generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Sample spacing in milliseconds.
    pub interval_ms: u64,

    /// Peak accelerometer noise while resting (magnitude units).
    pub rest_noise: f64,

    /// Peak pitch jitter in degrees.
    pub angle_jitter_deg: f64,

    /// Random seed for reproducibility (None = random).
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            rest_noise: 0.04,
            angle_jitter_deg: 1.5,
            seed: None,
        }
    }
}

impl SimConfig {
    fn rng(&self) -> Mcg128Xsl64 {
        match self.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        }
    }
}

/// Samples of a phone resting undisturbed for `duration_ms`.
pub fn still_stream(config: &SimConfig, start_ms: u64, duration_ms: u64) -> Vec<MotionSample> {
    let mut rng = config.rng();
    timestamps(config, start_ms, duration_ms)
        .map(|t| {
            let m = rng.gen_range(0.0..config.rest_noise);
            MotionSample::new(t, jittered_accel(&mut rng, m), Rotation::default())
        })
        .collect()
}

/// Samples of a phone being picked up: a burst of high-magnitude motion.
pub fn pickup_stream(config: &SimConfig, start_ms: u64, duration_ms: u64) -> Vec<MotionSample> {
    let mut rng = config.rng();
    timestamps(config, start_ms, duration_ms)
        .map(|t| {
            let m = rng.gen_range(0.9..2.5);
            MotionSample::new(t, jittered_accel(&mut rng, m), Rotation::default())
        })
        .collect()
}

/// A full focus-session profile: settle, rest for `rest_ms`, then a pickup
/// burst. Feeding this to an armed set-down timer walks it through
/// settling, stationary, and a motion-triggered pause.
pub fn focus_profile(config: &SimConfig, rest_ms: u64) -> Vec<MotionSample> {
    let mut samples = still_stream(config, 0, rest_ms);
    let pickup_start = rest_ms + config.interval_ms;
    samples.extend(pickup_stream(config, pickup_start, 600));
    samples
}

/// Pitch-angle stream of `reps` squat cycles around `baseline_deg`.
///
/// Each cycle dips `dip_deg` below the baseline and returns, with the hold
/// phases sized so consecutive reps clear a 600 ms minimum interval.
pub fn squat_stream(
    config: &SimConfig,
    baseline_deg: f64,
    dip_deg: f64,
    reps: usize,
) -> Vec<MotionSample> {
    let mut rng = config.rng();
    let mut samples = Vec::new();
    let mut t = 0;

    let mut push_phase = |samples: &mut Vec<MotionSample>, angle: f64, hold_ms: u64, t: &mut u64| {
        let mut elapsed = 0;
        while elapsed <= hold_ms {
            let jitter = rng.gen_range(-config.angle_jitter_deg..=config.angle_jitter_deg);
            samples.push(MotionSample::from_pitch_deg(*t, angle + jitter));
            *t += config.interval_ms;
            elapsed += config.interval_ms;
        }
    };

    // Calibration hold at the baseline before the first dip.
    push_phase(&mut samples, baseline_deg, 300, &mut t);

    for _ in 0..reps {
        push_phase(&mut samples, baseline_deg - dip_deg, 400, &mut t);
        push_phase(&mut samples, baseline_deg, 400, &mut t);
    }

    samples
}

fn timestamps(
    config: &SimConfig,
    start_ms: u64,
    duration_ms: u64,
) -> impl Iterator<Item = u64> + '_ {
    let count = duration_ms / config.interval_ms + 1;
    (0..count).map(move |i| start_ms + i * config.interval_ms)
}

fn jittered_accel(rng: &mut Mcg128Xsl64, magnitude: f64) -> Vec3 {
    // Spread the magnitude across axes with a random orientation so the
    // vector norm stays at the requested magnitude.
    let theta = rng.gen_range(0.0..std::f64::consts::TAU);
    let phi = rng.gen_range(0.0..std::f64::consts::PI);
    Vec3::new(
        magnitude * phi.sin() * theta.cos(),
        magnitude * phi.sin() * theta.sin(),
        magnitude * phi.cos(),
    )
}
