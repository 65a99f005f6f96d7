//! Command definitions for the kiosk CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{parse_time_of_day, parse_weekdays, Alarm, WeekdayMask};

// ============================================================================
// CLI Structure
// ============================================================================

/// Kiosk CLI - alarms and media playback for an embedded kiosk device
#[derive(Parser, Debug)]
#[command(
    name = "kiosk",
    version,
    about = "Alarm scheduler and media player supervisor for a kiosk device",
    long_about = "Manages persisted alarms, fires them from a periodic due check, \
                  and drives an mplayer subprocess for audio and video playback.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to <config dir>/kiosk/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the alarm document, overriding the config file
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fire alarms without starting the sound helper
    #[arg(long, global = true)]
    pub no_sound: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage alarms
    #[command(subcommand)]
    Alarm(AlarmCommand),

    /// Run one due check now
    Check,

    /// Run due checks periodically until interrupted
    Watch(WatchArgs),

    /// Play a media file until it ends
    Play(PlayArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Alarm management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AlarmCommand {
    /// List all alarms
    List {
        /// Print the alarms as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a new alarm
    Add(AddArgs),

    /// Remove an alarm
    Remove {
        /// Alarm id
        id: String,
    },

    /// Enable an alarm
    Enable {
        /// Alarm id
        id: String,
    },

    /// Disable an alarm
    Disable {
        /// Alarm id
        id: String,
    },
}

// ============================================================================
// Add Command Arguments
// ============================================================================

/// Wall-clock time given on the command line as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

/// Arguments for `alarm add`
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Alarm time (HH:MM, 24-hour)
    #[arg(short, long, value_parser = parse_time_arg)]
    pub time: TimeOfDay,

    /// Alarm id (a random UUID if omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Label shown when the alarm fires
    #[arg(short, long, default_value = "")]
    pub label: String,

    /// Repeat days: `once`, `daily` or a list such as `mon,wed,fri`
    #[arg(short, long, default_value = "once", value_parser = parse_weekdays)]
    pub repeat: WeekdayMask,

    /// Sound file passed to the sound helper
    #[arg(short, long)]
    pub sound: Option<String>,

    /// Snooze duration in minutes (0-60)
    #[arg(
        long,
        default_value = "0",
        value_parser = clap::value_parser!(u32).range(0..=60)
    )]
    pub snooze: u32,

    /// Delete the alarm after it fires
    #[arg(long)]
    pub remove_after_trigger: bool,

    /// Create the alarm disabled
    #[arg(long)]
    pub disabled: bool,
}

impl AddArgs {
    /// Builds the alarm record, generating an id when none was given.
    #[must_use]
    pub fn to_alarm(&self) -> Alarm {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut alarm = Alarm::new(id, self.time.hour, self.time.minute)
            .with_label(self.label.clone())
            .with_repeat(self.repeat)
            .with_snooze(self.snooze)
            .with_enabled(!self.disabled)
            .remove_after_trigger(self.remove_after_trigger);
        if let Some(sound) = &self.sound {
            alarm = alarm.with_sound(sound.clone());
        }
        alarm
    }
}

// ============================================================================
// Watch / Play Arguments
// ============================================================================

/// Arguments for `watch`
#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Seconds between due checks (1-60), overriding the config file
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=60))]
    pub interval: Option<u64>,
}

/// Arguments for `play`
#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    /// Media file to play
    pub file: PathBuf,

    /// Use the video player instead of the audio player
    #[arg(long)]
    pub video: bool,

    /// Player executable, overriding the config file
    #[arg(long, value_name = "PATH")]
    pub player: Option<PathBuf>,

    /// Output driver, overriding the config file
    #[arg(long)]
    pub driver: Option<String>,
}

// ============================================================================
// Validation Functions
// ============================================================================

fn parse_time_arg(s: &str) -> Result<TimeOfDay, String> {
    parse_time_of_day(s).map(|(hour, minute)| TimeOfDay { hour, minute })
}

// ============================================================================
// Tests
// ============================================================================
