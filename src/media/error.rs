//! Media session error types.
//!
//! Failures are reported to the immediate caller only. A failed command write
//! does not tear the session down; callers decide whether to `quit()`.

use std::io;

use thiserror::Error;

/// Errors that can occur while supervising a player subprocess.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The player program could not be started.
    #[error("failed to start player '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The output pipe could not be created.
    #[error("failed to create player pipe: {0}")]
    Pipe(#[source] io::Error),

    /// The background reader thread could not be started.
    #[error("failed to start response reader: {0}")]
    Reader(#[source] io::Error),

    /// No session is active.
    #[error("{0} player is not running")]
    NotRunning(&'static str),

    /// Writing a command to the player failed.
    #[error("failed to send '{command}' to player: {source}")]
    Write {
        /// Command line that could not be written.
        command: String,
        /// Underlying write error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the player to exit failed.
    #[error("failed to wait for player exit: {0}")]
    Wait(#[source] io::Error),

    /// The argument cannot be expressed as a protocol line.
    #[error("invalid player argument: {0}")]
    InvalidArgument(String),
}

impl MediaError {
    /// Returns true if the player is probably gone (broken pipe or not started).
    #[must_use]
    pub fn is_session_dead(&self) -> bool {
        match self {
            Self::NotRunning(_) => true,
            Self::Write { source, .. } => source.kind() == io::ErrorKind::BrokenPipe,
            _ => false,
        }
    }

    /// Returns true if the error happened while starting a session.
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::Pipe(_) | Self::Reader(_))
    }

    /// Returns a short suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "check that the player executable is installed and on PATH",
            Self::Pipe(_) | Self::Reader(_) => "the system may be out of file descriptors or threads",
            Self::NotRunning(_) => "initialize the player before sending commands",
            Self::Write { .. } => "the player may have exited; quit and initialize it again",
            Self::Wait(_) => "the player process could not be reaped",
            Self::InvalidArgument(_) => "file paths must not contain line breaks",
        }
    }
}

/// Result type for media session operations.
pub type Result<T> = std::result::Result<T, MediaError>;
