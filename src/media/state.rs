//! Playback state shared between callers and the response reader.
//!
//! The reader is the only writer of reported values; callers only read,
//! except for the optimistic playing flag set by `play_file`. One mutex
//! guards the whole state and is never held across I/O.
//!
//! Every session gets its own [`SessionShared`]. Only the observer slot
//! outlives a session, so a reader left draining after `quit` can never
//! touch the state of the next session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use super::events::{PlaybackEvent, PlaybackObserver};
use super::protocol::ResponseLine;

/// Last known playback state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Position in seconds (0 until reported)
    pub position: u32,
    /// Clip length in seconds (0 until reported)
    pub length: u32,
    /// Whether a clip is believed to be playing
    pub playing: bool,
    /// Title metadata (empty until reported)
    pub title: String,
    /// Artist metadata (empty until reported)
    pub artist: String,
    /// Album metadata (empty until reported)
    pub album: String,
}

/// Observer registration shared by a player and all of its sessions.
pub(crate) type ObserverSlot = Arc<RwLock<Option<Arc<dyn PlaybackObserver>>>>;

/// State of one session, owned jointly by the player and its reader thread.
#[derive(Default)]
pub(crate) struct SessionShared {
    state: Mutex<PlaybackState>,
    observer: ObserverSlot,
    /// Set once the player has let go of the session.
    retired: AtomicBool,
}

impl SessionShared {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates fresh session state that reports to `observer`.
    pub(crate) fn with_observer_slot(observer: ObserverSlot) -> Self {
        Self {
            observer,
            ..Self::default()
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> PlaybackState {
        self.lock_state().clone()
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.lock_state().playing = playing;
    }

    pub(crate) fn set_observer(&self, observer: Option<Arc<dyn PlaybackObserver>>) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = observer;
    }

    /// Applies one classified line; returns the event it raises, if any.
    pub(crate) fn apply(&self, response: ResponseLine) -> Option<PlaybackEvent> {
        let mut state = self.lock_state();
        match response {
            ResponseLine::Position(seconds) => state.position = seconds,
            ResponseLine::Length(seconds) => state.length = seconds,
            ResponseLine::Title(title) => state.title = title,
            ResponseLine::Artist(artist) => state.artist = artist,
            ResponseLine::Album(album) => state.album = album,
            ResponseLine::EndOfTrack => {
                state.playing = false;
                return Some(PlaybackEvent::EndOfTrack);
            }
            ResponseLine::Unrecognized => {}
        }
        None
    }

    /// Stops event delivery for this session.
    ///
    /// Once this returns no further `notify` reaches the observer.
    pub(crate) fn retire(&self) {
        let _slot = self.observer.write().unwrap_or_else(PoisonError::into_inner);
        self.retired.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Delivers `event` to the registered observer, outside the state lock.
    ///
    /// A retired session delivers nothing.
    pub(crate) fn notify(&self, event: PlaybackEvent) {
        let observer = {
            let slot = self.observer.read().unwrap_or_else(PoisonError::into_inner);
            if self.is_retired() {
                return;
            }
            slot.clone()
        };
        if let Some(observer) = observer {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::events::MockPlaybackObserver;

    #[test]
    fn test_initial_state_is_zeroed() {
        let shared = SessionShared::new();
        assert_eq!(shared.snapshot(), PlaybackState::default());
    }

    #[test]
    fn test_apply_reports() {
        let shared = SessionShared::new();
        assert_eq!(shared.apply(ResponseLine::Position(42)), None);
        assert_eq!(shared.apply(ResponseLine::Length(180)), None);
        shared.apply(ResponseLine::Title("Song".into()));
        shared.apply(ResponseLine::Artist("Band".into()));
        shared.apply(ResponseLine::Album("Record".into()));
        shared.apply(ResponseLine::Unrecognized);

        let state = shared.snapshot();
        assert_eq!(state.position, 42);
        assert_eq!(state.length, 180);
        assert_eq!(state.title, "Song");
        assert_eq!(state.artist, "Band");
        assert_eq!(state.album, "Record");
    }

    #[test]
    fn test_end_of_track_clears_playing() {
        let shared = SessionShared::new();
        shared.set_playing(true);
        assert_eq!(
            shared.apply(ResponseLine::EndOfTrack),
            Some(PlaybackEvent::EndOfTrack)
        );
        assert!(!shared.snapshot().playing);
    }

    #[test]
    fn test_notify_uses_latest_observer() {
        let shared = SessionShared::new();
        let first = Arc::new(MockPlaybackObserver::new());
        let second = Arc::new(MockPlaybackObserver::new());

        shared.notify(PlaybackEvent::EndOfTrack);
        shared.set_observer(Some(first.clone()));
        shared.set_observer(Some(second.clone()));
        shared.notify(PlaybackEvent::EndOfTrack);

        assert!(first.events().is_empty());
        assert_eq!(second.codes(), vec![1]);
    }

    #[test]
    fn test_retired_session_stays_silent() {
        let slot = ObserverSlot::default();
        let old = SessionShared::with_observer_slot(Arc::clone(&slot));
        let current = SessionShared::with_observer_slot(Arc::clone(&slot));
        let observer = Arc::new(MockPlaybackObserver::new());
        current.set_observer(Some(observer.clone()));

        old.retire();
        assert!(old.is_retired());
        old.notify(PlaybackEvent::ProcessExited);
        assert!(observer.events().is_empty());

        current.notify(PlaybackEvent::EndOfTrack);
        assert_eq!(observer.events(), vec![PlaybackEvent::EndOfTrack]);
    }

    #[test]
    fn test_sessions_share_only_the_observer() {
        let slot = ObserverSlot::default();
        let old = SessionShared::with_observer_slot(Arc::clone(&slot));
        old.apply(ResponseLine::Position(7));
        old.set_playing(true);

        let fresh = SessionShared::with_observer_slot(Arc::clone(&slot));
        assert_eq!(fresh.snapshot(), PlaybackState::default());

        let observer = Arc::new(MockPlaybackObserver::new());
        old.set_observer(Some(observer.clone()));
        fresh.notify(PlaybackEvent::EndOfTrack);
        assert_eq!(observer.codes(), vec![1]);
    }
}
