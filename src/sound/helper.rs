//! Sound playback through an external helper program.
//!
//! The helper is started with the sound path as its only argument, all
//! standard streams discarded. The caller never waits for it; a background
//! thread reaps the child when it exits.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use super::error::SoundError;

/// Helper invoked when no other program is configured.
pub const DEFAULT_SOUND_HELPER: &str = "./scripts/play_alarm.sh";

/// Starts a detached helper process for each alarm sound.
pub struct HelperSoundLauncher {
    /// Helper program path.
    program: PathBuf,
    /// Skip every launch; set from the `sound_enabled` config key.
    muted: bool,
}

impl HelperSoundLauncher {
    /// Creates a launcher for the given helper program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            muted: false,
        }
    }

    /// Turns every launch into a no-op when `muted` is true.
    ///
    /// Due checks still fire and notify; only the helper is skipped.
    #[must_use]
    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Returns true when launches are skipped.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Returns the helper program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Starts the helper for `sound` and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::EmptyPath` for an empty path and
    /// `SoundError::SpawnFailed` if the helper cannot be started.
    pub fn launch(&self, sound: &str) -> Result<(), SoundError> {
        if self.muted {
            debug!("Sound muted, skipping {}", sound);
            return Ok(());
        }
        if sound.is_empty() {
            return Err(SoundError::EmptyPath);
        }

        let child = Command::new(&self.program)
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SoundError::SpawnFailed {
                program: self.program.display().to_string(),
                source,
            })?;

        debug!(
            "Started sound helper {:?} (pid {}) for {}",
            self.program,
            child.id(),
            sound
        );
        reap_detached(child);
        Ok(())
    }
}

impl Default for HelperSoundLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_SOUND_HELPER)
    }
}

impl std::fmt::Debug for HelperSoundLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperSoundLauncher")
            .field("program", &self.program)
            .field("muted", &self.muted)
            .finish()
    }
}

/// Waits for `child` on a throwaway thread so it does not linger as a zombie.
fn reap_detached(mut child: Child) {
    let spawned = std::thread::Builder::new()
        .name("sound-helper-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) if !status.success() => debug!("Sound helper exited with {}", status),
            Ok(_) => {}
            Err(e) => debug!("Failed to wait for sound helper: {}", e),
        });
    if let Err(e) = spawned {
        warn!("Could not start reaper thread for sound helper: {}", e);
    }
}
