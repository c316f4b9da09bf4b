//! Reward ledger.
//!
//! A single non-negative counter of earned screen-time minutes. Mutation
//! clamps at zero and notifies subscribers synchronously; there is no other
//! invariant.

/// Handle returned by [`RewardLedger::subscribe`]; pass back to
/// `unsubscribe` to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

type Listener = Box<dyn FnMut(u32)>;

/// Accumulated bonus minutes of unrestricted device usage.
pub struct RewardLedger {
    minutes: u32,
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl RewardLedger {
    pub fn new(initial_minutes: u32) -> Self {
        Self {
            minutes: initial_minutes,
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Apply a signed delta, clamping the balance at zero, and notify every
    /// subscriber with the new balance. Returns the new balance.
    pub fn add_minutes(&mut self, delta: i64) -> u32 {
        let next = i64::from(self.minutes) + delta;
        self.minutes = next.clamp(0, i64::from(u32::MAX)) as u32;
        let balance = self.minutes;
        for (_, listener) in &mut self.listeners {
            listener(balance);
        }
        balance
    }

    pub fn subscribe(&mut self, listener: impl FnMut(u32) + 'static) -> ListenerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        ListenerHandle(id)
    }

    pub fn unsubscribe(&mut self, handle: ListenerHandle) {
        self.listeners.retain(|(id, _)| *id != handle.0);
    }
}

impl std::fmt::Debug for RewardLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardLedger")
            .field("minutes", &self.minutes)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for RewardLedger {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn add_minutes_accumulates() {
        let mut ledger = RewardLedger::new(140);
        assert_eq!(ledger.add_minutes(10), 150);
        assert_eq!(ledger.minutes(), 150);
    }

    #[test]
    fn balance_clamps_at_zero() {
        let mut ledger = RewardLedger::new(5);
        assert_eq!(ledger.add_minutes(-20), 0);
        assert_eq!(ledger.minutes(), 0);
    }

    #[test]
    fn subscribers_are_notified_synchronously() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut ledger = RewardLedger::new(0);
        ledger.subscribe(move |balance| sink.borrow_mut().push(balance));
        ledger.add_minutes(10);
        ledger.add_minutes(-3);
        assert_eq!(*seen.borrow(), vec![10, 7]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut ledger = RewardLedger::new(0);
        let handle = ledger.subscribe(move |balance| sink.borrow_mut().push(balance));
        ledger.add_minutes(10);
        ledger.unsubscribe(handle);
        ledger.add_minutes(10);
        assert_eq!(*seen.borrow(), vec![10]);
    }
}
