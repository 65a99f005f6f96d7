//! Display utilities for the kiosk CLI.
//!
//! This module provides formatted output for:
//! - Alarm listings and edits
//! - Fired alarms
//! - Playback progress
//! - Error messages

use crate::media::PlaybackState;
use crate::types::Alarm;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the alarm table.
    pub fn show_alarm_list(alarms: &[Alarm]) {
        if alarms.is_empty() {
            println!("No alarms");
            return;
        }
        println!("{}", Self::alarm_header());
        for alarm in alarms {
            println!("{}", Self::alarm_row(alarm));
        }
    }

    /// Shows a success message for alarm creation.
    pub fn show_alarm_added(alarm: &Alarm) {
        println!("* Added alarm {} at {}", alarm.id, alarm.time_string());
        if !alarm.label.is_empty() {
            println!("  Label: {}", alarm.label);
        }
        println!("  Repeat: {}", alarm.repeat);
    }

    /// Shows a success message for alarm removal.
    pub fn show_alarm_removed(id: &str) {
        println!("* Removed alarm {}", id);
    }

    /// Shows a success message for enabling or disabling an alarm.
    pub fn show_alarm_toggled(id: &str, enabled: bool) {
        let state = if enabled { "Enabled" } else { "Disabled" };
        println!("* {} alarm {}", state, id);
    }

    /// Shows an alarm that just fired.
    pub fn show_fired(alarm: &Alarm) {
        if alarm.label.is_empty() {
            println!("! Alarm {} ({})", alarm.id, alarm.time_string());
        } else {
            println!("! {} ({})", alarm.label, alarm.time_string());
        }
    }

    /// Shows the result of a one-off due check.
    pub fn show_check_result(fired: &[Alarm]) {
        if fired.is_empty() {
            println!("No alarms due");
        }
        for alarm in fired {
            Self::show_fired(alarm);
        }
    }

    /// Shows the now-playing header once metadata is known.
    pub fn show_now_playing(state: &PlaybackState) {
        if let Some(line) = Self::now_playing_line(state) {
            println!("> {}", line);
        }
    }

    /// Shows one progress line.
    pub fn show_progress(state: &PlaybackState) {
        println!("  {}", Self::progress_line(state));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    fn alarm_header() -> String {
        format!(
            "{:<36}  {:<5}  {:<3}  {:<20}  {}",
            "ID", "TIME", "ON", "REPEAT", "LABEL"
        )
    }

    fn alarm_row(alarm: &Alarm) -> String {
        let mut row = format!(
            "{:<36}  {:<5}  {:<3}  {:<20}  {}",
            alarm.id,
            alarm.time_string(),
            if alarm.enabled { "yes" } else { "no" },
            alarm.repeat.to_string(),
            alarm.label
        );
        if alarm.remove_after_trigger {
            row.push_str(" (remove after trigger)");
        }
        row.trim_end().to_string()
    }

    fn now_playing_line(state: &PlaybackState) -> Option<String> {
        let parts: Vec<&str> = [&state.title, &state.artist, &state.album]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" - "))
        }
    }

    fn progress_line(state: &PlaybackState) -> String {
        let (pm, ps) = Self::format_time(state.position);
        if state.length == 0 {
            return format!("{}:{:02}", pm, ps);
        }
        let (lm, ls) = Self::format_time(state.length);
        format!("{}:{:02} / {}:{:02}", pm, ps, lm, ls)
    }

    /// Formats seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        (total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
