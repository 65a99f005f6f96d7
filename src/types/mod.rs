//! Core data types for the kiosk core.
//!
//! This module defines the data structures used for:
//! - Alarm records as stored in the alarm document
//! - The 7-day weekday repeat mask (Sunday first)
//! - Range validation applied on every write

use std::fmt;

use chrono::Weekday;
use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

mod lenient;

/// Number of days in the repeat mask.
pub const DAYS_PER_WEEK: usize = 7;

/// Short day names, indexed Sunday first.
const DAY_NAMES: [&str; DAYS_PER_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

// ============================================================================
// WeekdayMask
// ============================================================================

/// Set of weekdays on which an alarm repeats.
///
/// Index 0 is Sunday, 6 is Saturday. An empty mask marks a one-shot alarm.
/// On disk the mask is a 7-element array of `0`/`1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    const FULL: u8 = 0b0111_1111;

    /// Returns a mask with no days selected (one-shot).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns a mask with every day selected.
    #[must_use]
    pub const fn all() -> Self {
        Self(Self::FULL)
    }

    /// Builds a mask from Sunday-first flags.
    #[must_use]
    pub fn from_flags(flags: [bool; DAYS_PER_WEEK]) -> Self {
        flags
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(Self::empty(), |mask, (index, _)| mask.with_index(index))
    }

    /// Builds a mask from a list of weekdays.
    #[must_use]
    pub fn from_days(days: &[Weekday]) -> Self {
        days.iter().fold(Self::empty(), |mask, day| mask.with(*day))
    }

    /// Returns the Sunday-first flags of this mask.
    #[must_use]
    pub fn to_flags(self) -> [bool; DAYS_PER_WEEK] {
        let mut flags = [false; DAYS_PER_WEEK];
        for (index, flag) in flags.iter_mut().enumerate() {
            *flag = self.contains_index(index);
        }
        flags
    }

    /// Returns a copy of this mask with `day` added.
    #[must_use]
    pub fn with(self, day: Weekday) -> Self {
        self.with_index(day.num_days_from_sunday() as usize)
    }

    fn with_index(self, index: usize) -> Self {
        if index < DAYS_PER_WEEK {
            Self(self.0 | (1 << index))
        } else {
            self
        }
    }

    /// Returns true if `day` is selected.
    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.contains_index(day.num_days_from_sunday() as usize)
    }

    /// Returns true if the Sunday-first day `index` is selected.
    #[must_use]
    pub fn contains_index(self, index: usize) -> bool {
        index < DAYS_PER_WEEK && self.0 & (1 << index) != 0
    }

    /// Returns true if no day is selected.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every day is selected.
    #[must_use]
    pub fn is_full(self) -> bool {
        self.0 == Self::FULL
    }

    /// Number of selected days.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

impl fmt::Display for WeekdayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("once");
        }
        if self.is_full() {
            return f.write_str("daily");
        }
        let days: Vec<&str> = DAY_NAMES
            .iter()
            .enumerate()
            .filter(|(index, _)| self.contains_index(*index))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&days.join(","))
    }
}

impl Serialize for WeekdayMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(DAYS_PER_WEEK))?;
        for flag in self.to_flags() {
            seq.serialize_element(&u8::from(flag))?;
        }
        seq.end()
    }
}

/// One entry of the on-disk repeat array.
///
/// Hand-edited documents sometimes carry `true`/`false` instead of `1`/`0`.
/// Anything else counts as unset.
#[derive(Deserialize)]
#[serde(untagged)]
enum RepeatFlag {
    Bool(bool),
    Number(f64),
    Other(serde::de::IgnoredAny),
}

impl RepeatFlag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(set) => *set,
            Self::Number(value) => *value != 0.0,
            Self::Other(_) => false,
        }
    }
}

impl<'de> Deserialize<'de> for WeekdayMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Vec<Option<RepeatFlag>> = Vec::deserialize(deserializer)?;
        let mut flags = [false; DAYS_PER_WEEK];
        for (flag, entry) in flags.iter_mut().zip(raw.iter()) {
            *flag = entry.as_ref().is_some_and(RepeatFlag::is_set);
        }
        Ok(Self::from_flags(flags))
    }
}

// ============================================================================
// Alarm
// ============================================================================

/// A user-defined alarm.
///
/// Field names match the alarm document. Missing fields load as
/// zero/false/empty, and so do fields holding a value of the wrong type;
/// a single bad field never costs the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alarm {
    /// Opaque, stable identifier
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    /// Display label
    #[serde(deserialize_with = "lenient::text")]
    pub label: String,
    /// Whether the alarm is armed
    #[serde(deserialize_with = "lenient::flag")]
    pub enabled: bool,
    /// Hour of day (0-23)
    #[serde(deserialize_with = "lenient::whole_number")]
    pub hour: u32,
    /// Minute of hour (0-59)
    #[serde(deserialize_with = "lenient::whole_number")]
    pub minute: u32,
    /// Weekday repeat set; empty means one-shot
    #[serde(deserialize_with = "lenient::repeat_mask")]
    pub repeat: WeekdayMask,
    /// Snooze interval in minutes (informational)
    #[serde(deserialize_with = "lenient::whole_number")]
    pub snooze_minutes: u32,
    /// Sound resource path; empty means silent
    #[serde(deserialize_with = "lenient::text")]
    pub sound: String,
    /// Delete the record once it has fired
    #[serde(deserialize_with = "lenient::flag")]
    pub remove_after_trigger: bool,
}

impl Alarm {
    /// Creates an enabled one-shot alarm at `hour:minute`.
    pub fn new(id: impl Into<String>, hour: u32, minute: u32) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            hour,
            minute,
            ..Self::default()
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the weekday repeat set.
    pub fn with_repeat(mut self, repeat: WeekdayMask) -> Self {
        self.repeat = repeat;
        self
    }

    /// Sets the sound resource path.
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    /// Sets the snooze interval in minutes.
    pub fn with_snooze(mut self, minutes: u32) -> Self {
        self.snooze_minutes = minutes;
        self
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Marks the alarm for deletion after it fires.
    pub fn remove_after_trigger(mut self, remove: bool) -> Self {
        self.remove_after_trigger = remove;
        self
    }

    /// Returns true if the alarm has no weekday selected.
    pub fn is_one_shot(&self) -> bool {
        self.repeat.is_empty()
    }

    /// Returns true if a sound is configured.
    pub fn has_sound(&self) -> bool {
        !self.sound.is_empty()
    }

    /// Returns the time of day as `HH:MM`.
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// Validates the alarm before it is written to the store.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("alarm id must not be empty".to_string());
        }
        if self.hour > 23 {
            return Err(format!("hour must be in 0-23, got {}", self.hour));
        }
        if self.minute > 59 {
            return Err(format!("minute must be in 0-59, got {}", self.minute));
        }
        Ok(())
    }
}

/// Parses an `HH:MM` string into hour and minute.
///
/// Returns an error message if the string is malformed or out of range.
pub fn parse_time_of_day(s: &str) -> Result<(u32, u32), String> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got '{}'", s))?;
    let hour: u32 = hour
        .trim()
        .parse()
        .map_err(|_| format!("invalid hour in '{}'", s))?;
    let minute: u32 = minute
        .trim()
        .parse()
        .map_err(|_| format!("invalid minute in '{}'", s))?;
    if hour > 23 || minute > 59 {
        return Err(format!("time out of range: '{}'", s));
    }
    Ok((hour, minute))
}

/// Parses a comma-separated weekday list (`mon,wed,fri`, `daily`, `once`).
pub fn parse_weekdays(s: &str) -> Result<WeekdayMask, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "once" | "none" => return Ok(WeekdayMask::empty()),
        "daily" | "all" => return Ok(WeekdayMask::all()),
        _ => {}
    }
    let mut days = Vec::new();
    for part in s.split(',') {
        let day: Weekday = part
            .trim()
            .parse()
            .map_err(|_| format!("unknown weekday '{}'", part.trim()))?;
        days.push(day);
    }
    Ok(WeekdayMask::from_days(&days))
}

// ============================================================================
// Tests
// ============================================================================
