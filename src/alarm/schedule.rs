//! Time-mask evaluation.
//!
//! Decides whether an alarm fires at a given local wall-clock time. Matching
//! is minute-granular; callers that poll more than once a minute rely on the
//! store disabling one-shot alarms after they fire.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::types::Alarm;

/// Returns true if `alarm` fires at local time `now`.
///
/// The alarm must be enabled and its hour/minute must equal `now`'s. A
/// one-shot alarm (empty repeat set) fires on any weekday; otherwise the
/// current weekday must be selected.
pub fn should_fire(alarm: &Alarm, now: NaiveDateTime) -> bool {
    if !alarm.enabled {
        return false;
    }
    if alarm.hour != now.hour() || alarm.minute != now.minute() {
        return false;
    }
    alarm.is_one_shot() || alarm.repeat.contains(now.weekday())
}
