//! Kiosk configuration.
//!
//! Settings live in a JSON document, by default
//! `<config dir>/kiosk/config.json`. Every field has a serde default, so a
//! partial or missing file yields a complete configuration. A malformed file
//! falls back to defaults with a warning.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alarm::DEFAULT_ALARM_FILE;
use crate::media::{MediaKind, SessionCommand, DEFAULT_PLAYER};
use crate::sound::DEFAULT_SOUND_HELPER;

/// Application directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "kiosk";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Bounds for the due-check cadence in seconds.
///
/// The upper bound keeps at least one check inside every wall-clock minute.
pub const POLL_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=60;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_alarm_file() -> String {
    DEFAULT_ALARM_FILE.to_string()
}

fn default_sound_helper() -> PathBuf {
    PathBuf::from(DEFAULT_SOUND_HELPER)
}

fn default_sound_enabled() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_quit_timeout_secs() -> u64 {
    3
}

fn default_executable() -> PathBuf {
    PathBuf::from(DEFAULT_PLAYER)
}

fn default_audio() -> PlayerConfig {
    PlayerConfig::for_kind(MediaKind::Audio)
}

fn default_video() -> PlayerConfig {
    PlayerConfig::for_kind(MediaKind::Video)
}

// ============================================================================
// PlayerConfig
// ============================================================================

/// Subprocess settings for one media kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Player executable.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Output driver; `None` uses the kind's default.
    #[serde(default)]
    pub driver: Option<String>,
}

impl PlayerConfig {
    /// Default settings for `kind`.
    #[must_use]
    pub fn for_kind(kind: MediaKind) -> Self {
        Self {
            executable: default_executable(),
            driver: Some(kind.default_driver().to_string()),
        }
    }

    /// Builds the slave-mode command line for `kind`.
    #[must_use]
    pub fn command(&self, kind: MediaKind) -> SessionCommand {
        SessionCommand::player(kind, &self.executable, self.driver.as_deref())
    }
}

// ============================================================================
// KioskConfig
// ============================================================================

/// Top-level kiosk configuration.
///
/// # Example
///
/// ```
/// use kiosk::config::KioskConfig;
///
/// let config: KioskConfig = serde_json::from_str(r#"{"poll_interval_secs": 10}"#).unwrap();
/// assert_eq!(config.poll_interval().as_secs(), 10);
/// assert_eq!(config.alarm_file, "alarms.json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KioskConfig {
    /// Directory holding the alarm document.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Alarm document file name.
    #[serde(default = "default_alarm_file")]
    pub alarm_file: String,

    /// Helper program started when an alarm with a sound fires.
    #[serde(default = "default_sound_helper")]
    pub sound_helper: PathBuf,

    /// Whether fired alarms start the sound helper at all.
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,

    /// Due-check cadence for `watch`, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Audio player settings.
    #[serde(default = "default_audio")]
    pub audio: PlayerConfig,

    /// Video player settings.
    #[serde(default = "default_video")]
    pub video: PlayerConfig,

    /// Bounded wait for the player to exit on quit, in seconds.
    #[serde(default = "default_quit_timeout_secs")]
    pub quit_timeout_secs: u64,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            alarm_file: default_alarm_file(),
            sound_helper: default_sound_helper(),
            sound_enabled: default_sound_enabled(),
            poll_interval_secs: default_poll_interval_secs(),
            audio: default_audio(),
            video: default_video(),
            quit_timeout_secs: default_quit_timeout_secs(),
        }
    }
}

impl KioskConfig {
    /// Returns the default config file path, if a config directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration from `path`.
    ///
    /// A missing file yields defaults silently; an unreadable or malformed
    /// one yields defaults with a warning.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("failed to read config {}: {}; using defaults", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(config) => config,
            Err(e) => {
                warn!("malformed config {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Loads from `path`, or from the default location when `None`.
    #[must_use]
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path),
            None => Self::default_path()
                .map(|path| Self::load(&path))
                .unwrap_or_default(),
        }
    }

    /// Path of the alarm document.
    #[must_use]
    pub fn alarm_path(&self) -> PathBuf {
        self.data_dir.join(&self.alarm_file)
    }

    /// Due-check cadence, clamped to one check per minute at least.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        let (min, max) = (*POLL_INTERVAL_RANGE.start(), *POLL_INTERVAL_RANGE.end());
        Duration::from_secs(self.poll_interval_secs.clamp(min, max))
    }

    /// Bounded wait used when quitting a player.
    #[must_use]
    pub fn quit_timeout(&self) -> Duration {
        Duration::from_secs(self.quit_timeout_secs)
    }

    /// Player settings for `kind`.
    #[must_use]
    pub fn player(&self, kind: MediaKind) -> &PlayerConfig {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = KioskConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.alarm_path(), PathBuf::from("data/alarms.json"));
        assert_eq!(config.sound_helper, PathBuf::from("./scripts/play_alarm.sh"));
        assert!(config.sound_enabled);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.quit_timeout(), Duration::from_secs(3));
        assert_eq!(config.audio.driver.as_deref(), Some("oss"));
        assert_eq!(config.video.driver.as_deref(), Some("fbdev"));
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: KioskConfig =
            serde_json::from_str(r#"{"data_dir": "/var/kiosk", "video": {"driver": "sdl"}}"#)
                .unwrap();
        assert_eq!(config.alarm_path(), PathBuf::from("/var/kiosk/alarms.json"));
        assert_eq!(config.video.executable, PathBuf::from("mplayer"));
        assert_eq!(config.video.driver.as_deref(), Some("sdl"));
        assert_eq!(config.audio, PlayerConfig::for_kind(MediaKind::Audio));
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let mut config = KioskConfig {
            poll_interval_secs: 0,
            ..KioskConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));

        config.poll_interval_secs = 600;
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = KioskConfig::load(&dir.path().join("none.json"));
        assert_eq!(config, KioskConfig::default());
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(KioskConfig::load(&path), KioskConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"alarm_file": "wake.json", "quit_timeout_secs": 1}"#).unwrap();

        let config = KioskConfig::load_or_default(Some(&path));
        assert_eq!(config.alarm_file, "wake.json");
        assert_eq!(config.quit_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_sound_can_be_switched_off() {
        let config: KioskConfig = serde_json::from_str(r#"{"sound_enabled": false}"#).unwrap();
        assert!(!config.sound_enabled);
        assert_eq!(config.sound_helper, default_sound_helper());
    }

    #[test]
    fn test_player_command() {
        let config = KioskConfig::default();
        let cmd = config.player(MediaKind::Video).command(MediaKind::Video);
        assert_eq!(cmd.program(), "mplayer");
        assert!(cmd.get_args().contains(&OsString::from("fbdev")));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = KioskConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: KioskConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
