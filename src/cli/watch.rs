//! Periodic due-check loop for `kiosk watch`.
//!
//! Ticks on a tokio interval and runs the alarm due check on the blocking
//! pool. Each wall-clock minute is checked at most once, so a poll interval
//! shorter than a minute never fires a repeating alarm twice.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::alarm::AlarmService;
use crate::types::Alarm;

// ============================================================================
// MinuteGate
// ============================================================================

/// Admits each wall-clock minute once.
#[derive(Debug, Default)]
pub struct MinuteGate {
    last: Option<(NaiveDate, u32, u32)>,
}

impl MinuteGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a minute is seen.
    pub fn admit(&mut self, now: NaiveDateTime) -> bool {
        let key = (now.date(), now.hour(), now.minute());
        if self.last == Some(key) {
            return false;
        }
        self.last = Some(key);
        true
    }
}

// ============================================================================
// DueWatcher
// ============================================================================

/// Drives `AlarmService::check_due` from a timer.
pub struct DueWatcher {
    service: Arc<AlarmService>,
    period: Duration,
    gate: MinuteGate,
    fired_tx: mpsc::UnboundedSender<Alarm>,
}

impl DueWatcher {
    /// Creates a watcher that reports every fired alarm on `fired_tx`.
    pub fn new(
        service: Arc<AlarmService>,
        period: Duration,
        fired_tx: mpsc::UnboundedSender<Alarm>,
    ) -> Self {
        Self {
            service,
            period,
            gate: MinuteGate::new(),
            fired_tx,
        }
    }

    /// Runs until `shutdown` completes; returns how many alarms fired.
    ///
    /// `clock` supplies the local wall-clock time for each tick.
    pub async fn run<C, F>(&mut self, clock: C, shutdown: F) -> Result<usize>
    where
        C: Fn() -> NaiveDateTime,
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("watching {} every {:?}", self.service.path().display(), self.period);
        let mut fired_total = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let now = clock();
                    if !self.gate.admit(now) {
                        debug!("minute {} already checked", now.format("%H:%M"));
                        continue;
                    }
                    let fired = self.check(now).await?;
                    fired_total += fired.len();
                    for alarm in fired {
                        // A closed receiver only loses the report.
                        let _ = self.fired_tx.send(alarm);
                    }
                }
            }
        }

        info!("watch stopped after {} alarm(s)", fired_total);
        Ok(fired_total)
    }

    async fn check(&self, now: NaiveDateTime) -> Result<Vec<Alarm>> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.check_due(now))
            .await
            .context("Due check task failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::MockSoundLauncher;
    use crate::types::WeekdayMask;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tempfile::TempDir;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        // 2024-01-08 is a Monday.
        NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn service(dir: &TempDir) -> Arc<AlarmService> {
        Arc::new(
            AlarmService::open(dir.path().join("alarms.json"))
                .with_sound_launcher(Arc::new(MockSoundLauncher::new())),
        )
    }

    // ------------------------------------------------------------------------
    // MinuteGate Tests
    // ------------------------------------------------------------------------

    mod minute_gate_tests {
        use super::*;

        #[test]
        fn test_admits_each_minute_once() {
            let mut gate = MinuteGate::new();
            assert!(gate.admit(at(7, 30)));
            assert!(!gate.admit(at(7, 30)));
            assert!(!gate.admit(at(7, 30) + chrono::Duration::seconds(45)));
            assert!(gate.admit(at(7, 31)));
        }

        #[test]
        fn test_same_time_next_day_is_admitted() {
            let mut gate = MinuteGate::new();
            assert!(gate.admit(at(7, 30)));
            assert!(gate.admit(at(7, 30) + chrono::Duration::days(1)));
        }
    }

    // ------------------------------------------------------------------------
    // DueWatcher Tests
    // ------------------------------------------------------------------------

    mod watcher_tests {
        use super::*;

        #[tokio::test]
        async fn test_repeating_alarm_fires_once_per_minute() {
            let dir = TempDir::new().unwrap();
            let service = service(&dir);
            service
                .add(Alarm::new("daily", 7, 30).with_repeat(WeekdayMask::all()))
                .unwrap();

            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut watcher = DueWatcher::new(service.clone(), Duration::from_millis(10), tx);
            let fired = watcher
                .run(|| at(7, 30), tokio::time::sleep(Duration::from_millis(150)))
                .await
                .unwrap();

            assert_eq!(fired, 1);
            assert_eq!(rx.try_recv().unwrap().id, "daily");
            assert!(rx.try_recv().is_err());
            assert!(service.get("daily").unwrap().enabled);
        }

        #[tokio::test]
        async fn test_each_new_minute_is_checked() {
            let dir = TempDir::new().unwrap();
            let service = service(&dir);
            service.add(Alarm::new("first", 7, 30)).unwrap();
            service.add(Alarm::new("second", 7, 31)).unwrap();

            let minutes = AtomicI64::new(0);
            let clock = || {
                let n = minutes.fetch_add(1, Ordering::SeqCst).min(5);
                at(7, 30) + chrono::Duration::minutes(n)
            };

            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut watcher = DueWatcher::new(service.clone(), Duration::from_millis(10), tx);
            let fired = watcher
                .run(clock, tokio::time::sleep(Duration::from_millis(150)))
                .await
                .unwrap();

            assert_eq!(fired, 2);
            assert_eq!(rx.try_recv().unwrap().id, "first");
            assert_eq!(rx.try_recv().unwrap().id, "second");
            // One-shots are disabled once fired.
            assert!(!service.get("first").unwrap().enabled);
            assert!(!service.get("second").unwrap().enabled);
        }

        #[tokio::test]
        async fn test_immediate_shutdown() {
            let dir = TempDir::new().unwrap();
            let (tx, _rx) = mpsc::unbounded_channel();
            let mut watcher = DueWatcher::new(service(&dir), Duration::from_secs(30), tx);
            let fired = watcher.run(|| at(0, 0), async {}).await.unwrap();
            assert_eq!(fired, 0);
        }
    }
}
