//! Alarm sound side effect.
//!
//! When a due check fires an alarm that names a sound, the store hands the
//! path to a [`SoundLauncher`]. The production launcher starts an external
//! helper program detached from the caller:
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────────┐
//! │   AlarmService   │────▶│      SoundLauncher       │
//! │   (check_due)    │     ├──────────────────────────┤
//! └──────────────────┘     │ HelperSoundLauncher      │──▶ play_alarm.sh <path>
//!                          │ MockSoundLauncher (test) │
//!                          └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use kiosk::sound::{HelperSoundLauncher, SoundLauncher};
//!
//! let launcher = HelperSoundLauncher::new("./scripts/play_alarm.sh");
//! launcher.launch("/usr/share/sounds/bell.wav").expect("helper failed to start");
//! ```

mod error;
mod helper;

pub use error::SoundError;
pub use helper::{HelperSoundLauncher, DEFAULT_SOUND_HELPER};

/// Trait for alarm sound launchers.
///
/// This trait abstracts the sound side effect, allowing for different
/// implementations (e.g., helper process, mock for testing).
pub trait SoundLauncher: Send + Sync {
    /// Starts playing `sound`.
    ///
    /// This method must be non-blocking; the sound plays in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if playback could not be started.
    fn launch(&self, sound: &str) -> Result<(), SoundError>;
}

impl SoundLauncher for HelperSoundLauncher {
    fn launch(&self, sound: &str) -> Result<(), SoundError> {
        HelperSoundLauncher::launch(self, sound)
    }
}

/// Mock sound launcher for testing.
#[derive(Debug, Default)]
pub struct MockSoundLauncher {
    launch_calls: std::sync::Mutex<Vec<String>>,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockSoundLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn launch_count(&self) -> usize {
        self.calls().len()
    }

    #[must_use]
    pub fn get_launch_calls(&self) -> Vec<String> {
        self.calls().clone()
    }

    pub fn clear_calls(&self) {
        self.calls().clear();
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.launch_calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SoundLauncher for MockSoundLauncher {
    fn launch(&self, sound: &str) -> Result<(), SoundError> {
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SoundError::Other("Mock failure".to_string()));
        }
        self.calls().push(sound.to_string());
        Ok(())
    }
}
