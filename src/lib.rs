//! Kiosk Core Library
//!
//! Core services of an embedded kiosk device:
//! - Alarm store with crash-safe JSON persistence and a minute-granularity
//!   due check
//! - Weekday-mask evaluator deciding whether an alarm fires now
//! - Observer bridge delivering fired alarms to the presentation layer
//! - Fire-and-forget sound helper launched for alarms with a sound
//! - Media process supervisor driving mplayer in slave mode, with a
//!   background parser for its responses
//! - Configuration file and the CLI that wires everything together

pub mod alarm;
pub mod cli;
pub mod config;
pub mod media;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{parse_time_of_day, parse_weekdays, Alarm, WeekdayMask};

// Re-export alarm types
pub use alarm::{
    should_fire, AlarmError, AlarmObserver, AlarmService, ChannelAlarmObserver, MockAlarmObserver,
};

// Re-export media types
pub use media::{
    ChannelPlaybackObserver, MediaCommand, MediaError, MediaKind, MediaPlayer,
    MockPlaybackObserver, PlaybackEvent, PlaybackObserver, PlaybackState, SessionCommand,
};

// Re-export sound types
pub use sound::{HelperSoundLauncher, MockSoundLauncher, SoundError, SoundLauncher};

pub use config::KioskConfig;
