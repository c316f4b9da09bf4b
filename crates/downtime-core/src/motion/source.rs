//! Motion sample source abstraction.
//!
//! Platform sensor backends sit behind [`MotionSource`]: a session asks for
//! samples at a requested interval and gets back a [`Subscription`] handle.
//! The core registers exactly one active subscription per running session
//! and must unsubscribe synchronously before entering any terminal state,
//! so late samples can never mutate a logically finished session.
//!
//! Unavailability (no sensor on this device) is reported once, at subscribe
//! time, as [`SensorError::Unavailable`] -- a persistent "no sessions
//! possible" state for the caller, not a fault.

use std::collections::VecDeque;

use crate::error::SensorError;
use crate::motion::MotionSample;

/// Handle to an active sample subscription.
///
/// Opaque; pass it back to the source to pull samples or to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A source of periodic motion samples.
///
/// Delivery is pull-based: the event loop that owns the session calls
/// `next_sample` on each sensor callback slot. No sample is guaranteed --
/// jitter and dropped samples are normal and detectors must tolerate them.
pub trait MotionSource {
    /// Begin delivering samples at the requested nominal interval.
    fn subscribe(&mut self, interval_ms: u64) -> Result<Subscription, SensorError>;

    /// Next pending sample for this subscription, if any.
    fn next_sample(&mut self, sub: &Subscription) -> Option<MotionSample>;

    /// Stop delivery. Samples still queued are discarded; the handle is
    /// dead afterwards.
    fn unsubscribe(&mut self, sub: Subscription);
}

/// Deterministic in-memory source fed from a prerecorded sample sequence.
///
/// Used by tests and by the CLI `replay`/`simulate` commands in place of a
/// real device sensor.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queue: VecDeque<MotionSample>,
    next_id: u64,
    active: Option<u64>,
    pub interval_ms: u64,
}

impl ScriptedSource {
    pub fn new(samples: impl IntoIterator<Item = MotionSample>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
            next_id: 1,
            active: None,
            interval_ms: 0,
        }
    }

    /// Append more samples to the script.
    pub fn push(&mut self, sample: MotionSample) {
        self.queue.push_back(sample);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl MotionSource for ScriptedSource {
    fn subscribe(&mut self, interval_ms: u64) -> Result<Subscription, SensorError> {
        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(id);
        self.interval_ms = interval_ms;
        Ok(Subscription { id })
    }

    fn next_sample(&mut self, sub: &Subscription) -> Option<MotionSample> {
        if self.active != Some(sub.id) {
            return None;
        }
        self.queue.pop_front()
    }

    fn unsubscribe(&mut self, sub: Subscription) {
        if self.active == Some(sub.id) {
            self.active = None;
            self.queue.clear();
        }
    }
}

/// Source for devices without a motion sensor. Every subscribe attempt
/// reports [`SensorError::Unavailable`].
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl MotionSource for UnavailableSource {
    fn subscribe(&mut self, _interval_ms: u64) -> Result<Subscription, SensorError> {
        Err(SensorError::Unavailable)
    }

    fn next_sample(&mut self, _sub: &Subscription) -> Option<MotionSample> {
        None
    }

    fn unsubscribe(&mut self, _sub: Subscription) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: u64) -> MotionSample {
        MotionSample::from_magnitude(t, 0.05)
    }

    #[test]
    fn scripted_source_delivers_in_order() {
        let mut source = ScriptedSource::new([sample(0), sample(100), sample(200)]);
        let sub = source.subscribe(100).unwrap();
        assert_eq!(source.next_sample(&sub).unwrap().timestamp_ms, 0);
        assert_eq!(source.next_sample(&sub).unwrap().timestamp_ms, 100);
        assert_eq!(source.next_sample(&sub).unwrap().timestamp_ms, 200);
        assert!(source.next_sample(&sub).is_none());
    }

    #[test]
    fn unsubscribe_discards_pending_samples() {
        let mut source = ScriptedSource::new([sample(0), sample(100)]);
        let sub = source.subscribe(100).unwrap();
        assert!(source.next_sample(&sub).is_some());
        source.unsubscribe(sub);
        assert!(source.next_sample(&sub).is_none());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn stale_subscription_gets_nothing() {
        let mut source = ScriptedSource::new([sample(0)]);
        let old = source.subscribe(100).unwrap();
        let fresh = source.subscribe(100).unwrap();
        assert!(source.next_sample(&old).is_none());
        assert!(source.next_sample(&fresh).is_some());
    }

    #[test]
    fn unavailable_source_reports_unavailable() {
        let mut source = UnavailableSource;
        assert!(matches!(
            source.subscribe(100),
            Err(SensorError::Unavailable)
        ));
    }
}
