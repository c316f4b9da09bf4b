//! Motion sample model and source abstraction.
//!
//! A [`MotionSample`] is one instantaneous reading from the device motion
//! sensor: 3-axis acceleration plus pitch/roll/yaw rotation, stamped with a
//! capture timestamp in milliseconds. Samples are delivered at a fixed
//! nominal interval (50-120 ms in practice), consumed immediately by the
//! detectors, and never persisted.

mod source;

pub mod sim;

pub use source::{MotionSource, ScriptedSource, Subscription, UnavailableSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 3-axis vector reading (acceleration in g or m/s² depending on the
/// platform source; the detectors only compare magnitudes to thresholds
/// calibrated for the same unit).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Device rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Front-to-back tilt. The rep detector derives its angle stream from
    /// this axis.
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl Rotation {
    pub fn new(pitch: f64, roll: f64, yaw: f64) -> Self {
        Self { pitch, roll, yaw }
    }

    pub fn pitch_degrees(&self) -> f64 {
        self.pitch.to_degrees()
    }
}

/// One instantaneous motion reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Capture timestamp, milliseconds. Monotonic within a session.
    pub timestamp_ms: u64,
    pub accel: Vec3,
    pub rotation: Rotation,
}

impl MotionSample {
    pub fn new(timestamp_ms: u64, accel: Vec3, rotation: Rotation) -> Self {
        Self {
            timestamp_ms,
            accel,
            rotation,
        }
    }

    /// Sample with only a pitch angle (degrees), for angle-stream callers.
    pub fn from_pitch_deg(timestamp_ms: u64, pitch_deg: f64) -> Self {
        Self {
            timestamp_ms,
            accel: Vec3::default(),
            rotation: Rotation::new(pitch_deg.to_radians(), 0.0, 0.0),
        }
    }

    /// Sample with only an acceleration magnitude along z, for
    /// magnitude-stream callers.
    pub fn from_magnitude(timestamp_ms: u64, magnitude: f64) -> Self {
        Self {
            timestamp_ms,
            accel: Vec3::new(0.0, 0.0, magnitude),
            rotation: Rotation::default(),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.accel.magnitude()
    }
}

/// Frozen copy of the reading captured when the countdown committed to
/// stationary. Display-only: the set-down detector compares magnitudes, not
/// deltas against this snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub accel: Vec3,
    pub rotation: Rotation,
    pub captured_at: DateTime<Utc>,
}

impl MotionSnapshot {
    pub fn capture(sample: &MotionSample) -> Self {
        Self {
            accel: sample.accel,
            rotation: sample.rotation,
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_unit_axes() {
        assert_eq!(Vec3::new(1.0, 0.0, 0.0).magnitude(), 1.0);
        assert_eq!(Vec3::new(0.0, 3.0, 4.0).magnitude(), 5.0);
    }

    #[test]
    fn pitch_degrees_roundtrip() {
        let sample = MotionSample::from_pitch_deg(0, -20.0);
        assert!((sample.rotation.pitch_degrees() - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn sample_serde_roundtrip() {
        let sample = MotionSample::new(
            1200,
            Vec3::new(0.01, -0.02, 0.98),
            Rotation::new(0.1, 0.2, 0.3),
        );
        let json = serde_json::to_string(&sample).unwrap();
        let back: MotionSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
