//! Sound launcher error types.
//!
//! A failed sound never blocks or aborts a due check; these errors are logged
//! by the alarm store and otherwise dropped.

use thiserror::Error;

/// Errors that can occur when starting the sound helper.
#[derive(Debug, Error)]
pub enum SoundError {
    /// The alarm has no sound path.
    #[error("no sound path given")]
    EmptyPath,

    /// The helper program could not be started.
    #[error("failed to start sound helper '{program}': {source}")]
    SpawnFailed {
        /// Helper program that failed to start.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Generic launcher error.
    #[error("sound launcher error: {0}")]
    Other(String),
}

impl SoundError {
    /// Returns true if the helper program itself is missing.
    #[must_use]
    pub fn is_helper_missing(&self) -> bool {
        matches!(
            self,
            Self::SpawnFailed { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        assert!(SoundError::EmptyPath.to_string().contains("no sound path"));

        let err = SoundError::SpawnFailed {
            program: "./scripts/play_alarm.sh".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("play_alarm.sh"));
        assert!(err.to_string().contains("missing"));

        let err = SoundError::Other("busy".to_string());
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_is_helper_missing() {
        let missing = SoundError::SpawnFailed {
            program: "x".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "x"),
        };
        assert!(missing.is_helper_missing());

        let denied = SoundError::SpawnFailed {
            program: "x".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "x"),
        };
        assert!(!denied.is_helper_missing());
        assert!(!SoundError::EmptyPath.is_helper_missing());
    }
}
