//! Playback events delivered from the response reader.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};

use super::protocol::END_OF_TRACK_CODE;

/// Code delivered when the player's output stream closes.
pub const PROCESS_EXITED_CODE: i32 = 2;

/// Events raised by a media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The current clip played to its end.
    EndOfTrack,
    /// The player closed its output; the session is dead.
    ProcessExited,
}

impl PlaybackEvent {
    /// Returns the numeric event code (`1` for end of track).
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::EndOfTrack => END_OF_TRACK_CODE,
            Self::ProcessExited => PROCESS_EXITED_CODE,
        }
    }
}

/// Receives playback events.
///
/// Called on the reader thread with no session lock held. Implementations
/// must return quickly; the reader does not drain output while they run.
pub trait PlaybackObserver: Send + Sync {
    /// Handles one playback event.
    fn on_event(&self, event: PlaybackEvent);
}

impl<F> PlaybackObserver for F
where
    F: Fn(PlaybackEvent) + Send + Sync,
{
    fn on_event(&self, event: PlaybackEvent) {
        self(event)
    }
}

/// Forwards playback events to a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelPlaybackObserver {
    tx: Sender<PlaybackEvent>,
}

impl ChannelPlaybackObserver {
    /// Creates an observer and the receiving end of its unbounded channel.
    #[must_use]
    pub fn new() -> (Self, Receiver<PlaybackEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl PlaybackObserver for ChannelPlaybackObserver {
    fn on_event(&self, event: PlaybackEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

/// Mock observer for testing; records every event.
#[derive(Debug, Default)]
pub struct MockPlaybackObserver {
    events: Mutex<Vec<PlaybackEvent>>,
}

impl MockPlaybackObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn codes(&self) -> Vec<i32> {
        self.events().into_iter().map(PlaybackEvent::code).collect()
    }
}

impl PlaybackObserver for MockPlaybackObserver {
    fn on_event(&self, event: PlaybackEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
