mod detector;

pub use detector::{
    RepDetector, RepDetectorConfig, RepPhase, DOWN_DELTA_DEG, MIN_REP_INTERVAL_MS, UP_DELTA_DEG,
};
