//! # Downtime Core Library
//!
//! This library provides the core business logic for Downtime, a phone-down
//! focus timer with an exercise-to-earn reward loop. It implements a CLI-first
//! philosophy where all operations are available via a standalone CLI binary,
//! with any GUI shell being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Set-down timer**: A wall-clock countdown gated on the device lying
//!   still, driven by motion samples and a caller-invoked `tick()`
//! - **Rep detector**: A calibrated pitch-angle state machine that counts
//!   squat repetitions from device orientation
//! - **Storage**: SQLite-based session storage and TOML-based configuration
//! - **Motion**: Sensor source abstraction plus seeded simulation streams
//!
//! ## Key Components
//!
//! - [`SetDownTimer`]: Stillness-gated countdown state machine
//! - [`RepDetector`]: Squat repetition counter
//! - [`RewardLedger`]: Earned screen-time minute balance
//! - [`Database`]: Session and statistics persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod ledger;
pub mod motion;
pub mod reps;
pub mod setdown;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, SensorError, ValidationError};
pub use events::Event;
pub use ledger::RewardLedger;
pub use motion::{MotionSample, MotionSource, Rotation, Vec3};
pub use reps::{RepDetector, RepDetectorConfig, RepPhase};
pub use setdown::{DeviceState, SetDownConfig, SetDownTimer};
pub use storage::{Config, Database, SessionKind, SessionRecord, Stats};
