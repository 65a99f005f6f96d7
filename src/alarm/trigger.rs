//! Delivery of fired alarms to an observer.
//!
//! The store holds a single observer slot. Closures, a channel adapter and a
//! recording mock all implement [`AlarmObserver`].

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::types::Alarm;

/// Receives alarms as they fire.
///
/// Called synchronously from within the due check, after one-shot alarms have
/// been disabled and before remove-after-trigger alarms are deleted. The store
/// lock is not held, so implementations may call back into the store.
pub trait AlarmObserver: Send + Sync {
    /// Handles one fired alarm.
    fn on_alarm(&self, alarm: &Alarm);
}

impl<F> AlarmObserver for F
where
    F: Fn(&Alarm) + Send + Sync,
{
    fn on_alarm(&self, alarm: &Alarm) {
        self(alarm)
    }
}

// ============================================================================
// ChannelAlarmObserver
// ============================================================================

/// Forwards fired alarms to a crossbeam channel.
///
/// Lets a UI thread drain trigger events on its own schedule.
#[derive(Debug, Clone)]
pub struct ChannelAlarmObserver {
    tx: Sender<Alarm>,
}

impl ChannelAlarmObserver {
    /// Creates an observer and the receiving end of its unbounded channel.
    #[must_use]
    pub fn new() -> (Self, Receiver<Alarm>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    /// Creates an observer around an existing sender.
    #[must_use]
    pub fn from_sender(tx: Sender<Alarm>) -> Self {
        Self { tx }
    }
}

impl AlarmObserver for ChannelAlarmObserver {
    fn on_alarm(&self, alarm: &Alarm) {
        if self.tx.send(alarm.clone()).is_err() {
            debug!("Alarm receiver dropped, discarding trigger for {}", alarm.id);
        }
    }
}

// ============================================================================
// MockAlarmObserver
// ============================================================================

/// Mock observer for testing; records every alarm it receives.
#[derive(Debug, Default)]
pub struct MockAlarmObserver {
    fired: Mutex<Vec<Alarm>>,
}

impl MockAlarmObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fire_count(&self) -> usize {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn fired(&self) -> Vec<Alarm> {
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn fired_ids(&self) -> Vec<String> {
        self.fired().into_iter().map(|alarm| alarm.id).collect()
    }

    pub fn clear(&self) {
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AlarmObserver for MockAlarmObserver {
    fn on_alarm(&self, alarm: &Alarm) {
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alarm.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_observer() {
        let count = AtomicUsize::new(0);
        let observer = |_: &Alarm| {
            count.fetch_add(1, Ordering::SeqCst);
        };
        observer.on_alarm(&Alarm::new("a1", 7, 0));
        observer.on_alarm(&Alarm::new("a2", 7, 0));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_channel_observer_delivers_copies() {
        let (observer, rx) = ChannelAlarmObserver::new();
        observer.on_alarm(&Alarm::new("a1", 7, 0).with_label("wake"));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id, "a1");
        assert_eq!(received.label, "wake");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_observer_tolerates_dropped_receiver() {
        let (observer, rx) = ChannelAlarmObserver::new();
        drop(rx);
        observer.on_alarm(&Alarm::new("a1", 7, 0));
    }

    #[test]
    fn test_mock_records_in_order() {
        let mock = MockAlarmObserver::new();
        mock.on_alarm(&Alarm::new("first", 7, 0));
        mock.on_alarm(&Alarm::new("second", 7, 0));

        assert_eq!(mock.fire_count(), 2);
        assert_eq!(mock.fired_ids(), vec!["first", "second"]);

        mock.clear();
        assert_eq!(mock.fire_count(), 0);
    }
}
