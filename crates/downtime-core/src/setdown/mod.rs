mod engine;
mod session;

pub use engine::{
    DeviceState, SetDownConfig, SetDownTimer, MOTION_END_THRESHOLD, STATIONARY_DURATION_MS,
    STATIONARY_THRESHOLD,
};
pub use session::{KvSessionStore, MemorySessionStore, SessionStore};
