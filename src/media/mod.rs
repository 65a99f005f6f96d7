//! Media process supervision.
//!
//! A [`MediaPlayer`] drives one external playback subprocess (mplayer in
//! slave mode) for one [`MediaKind`]. Commands are written to the child's
//! standard input; its standard output and error share one pipe that a
//! dedicated reader thread drains into the shared [`PlaybackState`].
//!
//! ```text
//!   caller ──send()──▶ stdin ──▶ ┌────────────┐
//!                                │  mplayer   │
//!   snapshot() ◀── state ◀── reader ◀── stdout+stderr
//!                                └────────────┘
//! ```
//!
//! Only [`MediaPlayer::quit`] blocks; every other command is a single pipe
//! write with no acknowledgment awaited.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiosk::media::{MediaKind, MediaPlayer, PlaybackEvent};
//!
//! let mut player = MediaPlayer::new(MediaKind::Audio);
//! player.init(None, None)?;
//! player.set_observer(Arc::new(|event: PlaybackEvent| {
//!     println!("player event {}", event.code());
//! }));
//! player.play_file("/music/My Song.mp3")?;
//! player.query_position()?;
//! println!("at {}s", player.position());
//! player.quit()?;
//! # Ok::<(), kiosk::media::MediaError>(())
//! ```

pub mod error;
pub mod events;
pub mod protocol;
mod reader;
pub mod state;

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use error::{MediaError, Result};
pub use events::{
    ChannelPlaybackObserver, MockPlaybackObserver, PlaybackEvent, PlaybackObserver,
    PROCESS_EXITED_CODE,
};
pub use protocol::{classify, MediaCommand, ResponseLine, END_OF_TRACK_CODE};
pub use state::PlaybackState;

use state::{ObserverSlot, SessionShared};

/// Player executable used when none is given.
pub const DEFAULT_PLAYER: &str = "mplayer";

/// Default bounded wait for the player to exit in `quit`.
pub const DEFAULT_QUIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Poll interval while waiting for the player to exit.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long `quit` waits for the reader thread after the player exited.
const READER_JOIN_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// MediaKind
// ============================================================================

/// Kind of media a player session handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Audio only; video output disabled.
    Audio,
    /// Video on the framebuffer, audio through OSS.
    Video,
}

impl MediaKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    /// Output driver used when none is configured.
    pub fn default_driver(&self) -> &'static str {
        match self {
            MediaKind::Audio => "oss",
            MediaKind::Video => "fbdev",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SessionCommand
// ============================================================================

/// Program and arguments used to start a player subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl SessionCommand {
    /// Creates a command for `program` with no arguments.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// Builds the slave-mode command line for `kind`.
    ///
    /// Audio runs with `-vo null -ao <driver>`, video with
    /// `-vo <driver> -ao oss`. A missing driver uses the kind's default.
    pub fn player(kind: MediaKind, executable: impl AsRef<OsStr>, driver: Option<&str>) -> Self {
        let driver = driver.unwrap_or(kind.default_driver());
        let base = Self::new(executable).args(["-slave", "-idle", "-quiet"]);
        match kind {
            MediaKind::Audio => base.args(["-vo", "null", "-ao", driver]),
            MediaKind::Video => base.args(["-vo", driver, "-ao", "oss"]),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Returns the program.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Returns the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

// ============================================================================
// MediaPlayer
// ============================================================================

/// A live subprocess with its input pipe and reader thread.
struct Session {
    child: Child,
    stdin: ChildStdin,
    reader: Option<JoinHandle<()>>,
}

/// Supervisor for one player subprocess.
///
/// Owns the child process and its input pipe exclusively. Playback state is
/// shared with the reader thread and readable at any time without blocking
/// on I/O.
pub struct MediaPlayer {
    kind: MediaKind,
    observer: ObserverSlot,
    /// State of the current session, or of the last one after `quit`.
    shared: Arc<SessionShared>,
    session: Option<Session>,
    quit_timeout: Duration,
}

impl MediaPlayer {
    /// Creates an idle player for `kind`; no process is started yet.
    pub fn new(kind: MediaKind) -> Self {
        let observer = ObserverSlot::default();
        Self {
            kind,
            shared: Arc::new(SessionShared::with_observer_slot(Arc::clone(&observer))),
            observer,
            session: None,
            quit_timeout: DEFAULT_QUIT_TIMEOUT,
        }
    }

    /// Sets the bounded wait used by [`quit`](Self::quit).
    #[must_use]
    pub fn with_quit_timeout(mut self, timeout: Duration) -> Self {
        self.quit_timeout = timeout;
        self
    }

    /// Returns the media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Returns true while a session is active.
    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the subprocess id of the active session.
    pub fn pid(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.child.id())
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Starts the player in slave mode.
    ///
    /// `executable` defaults to `mplayer` and `driver` to the kind's default
    /// output driver. A second call while a session is active does nothing.
    ///
    /// # Errors
    ///
    /// Returns a startup error if the process, its pipes or the reader
    /// thread cannot be created. Nothing is retried.
    pub fn init(&mut self, executable: Option<&Path>, driver: Option<&str>) -> Result<()> {
        let executable = executable.map_or_else(|| OsStr::new(DEFAULT_PLAYER), Path::as_os_str);
        self.start(SessionCommand::player(self.kind, executable, driver))
    }

    /// Starts a session from an explicit command line.
    ///
    /// A second call while a session is active does nothing.
    ///
    /// # Errors
    ///
    /// Returns a startup error if the process, its pipes or the reader
    /// thread cannot be created.
    pub fn start(&mut self, command: SessionCommand) -> Result<()> {
        if self.session.is_some() {
            debug!("[{}] player already running", self.kind);
            return Ok(());
        }

        let (output, writer) = io::pipe().map_err(MediaError::Pipe)?;
        let error_writer = writer.try_clone().map_err(MediaError::Pipe)?;

        // The Command holds the parent's copies of the write end; dropping it
        // right after spawn lets the reader see end of stream on child exit.
        let mut child = {
            let mut cmd = Command::new(&command.program);
            cmd.args(&command.args)
                .stdin(Stdio::piped())
                .stdout(writer)
                .stderr(error_writer);
            cmd.spawn().map_err(|source| MediaError::Spawn {
                program: command.program.to_string_lossy().into_owned(),
                source,
            })?
        };

        let Some(stdin) = child.stdin.take() else {
            abandon(&mut child);
            return Err(MediaError::Pipe(io::Error::other("player stdin was not captured")));
        };

        let shared = Arc::new(SessionShared::with_observer_slot(Arc::clone(&self.observer)));
        let reader = match reader::spawn_reader(self.kind, output, Arc::clone(&shared)) {
            Ok(handle) => handle,
            Err(e) => {
                abandon(&mut child);
                return Err(MediaError::Reader(e));
            }
        };

        info!(
            "[{}] started player {:?} pid={}",
            self.kind,
            command.program,
            child.id()
        );
        self.shared = shared;
        self.session = Some(Session {
            child,
            stdin,
            reader: Some(reader),
        });
        Ok(())
    }

    /// Asks the player to exit and reclaims the session.
    ///
    /// Sends `quit`, waits up to the quit timeout for the process to exit,
    /// kills it if it is still alive, then closes the pipes. Does nothing if
    /// no session is active.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Wait` if the process status cannot be collected.
    pub fn quit(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        if let Err(e) = write_command(&mut session.stdin, &MediaCommand::Quit) {
            debug!("[{}] quit command not delivered: {}", self.kind, e);
        }

        match wait_bounded(&mut session.child, self.quit_timeout).map_err(MediaError::Wait)? {
            Some(status) => info!("[{}] player exited with {}", self.kind, status),
            None => {
                warn!(
                    "[{}] player did not exit within {:?}, killing it",
                    self.kind, self.quit_timeout
                );
                if let Err(e) = session.child.kill() {
                    debug!("[{}] kill failed: {}", self.kind, e);
                }
                session.child.wait().map_err(MediaError::Wait)?;
            }
        }

        drop(session.stdin);
        if let Some(reader) = session.reader.take() {
            join_reader(self.kind, reader);
        }
        self.shared.set_playing(false);
        self.shared.retire();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Sends one protocol command.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotRunning` without a session and
    /// `MediaError::Write` if the pipe write fails. The session is kept
    /// either way.
    pub fn send(&mut self, command: MediaCommand) -> Result<()> {
        let kind = self.kind;
        let session = self
            .session
            .as_mut()
            .ok_or(MediaError::NotRunning(kind.as_str()))?;
        debug!("[{}] send_cmd: {}", kind, command);
        write_command(&mut session.stdin, &command).map_err(|source| {
            warn!("[{}] failed to send '{}': {}", kind, command, source);
            MediaError::Write {
                command: command.encode(),
                source,
            }
        })
    }

    /// Loads and plays `path`, marking the session as playing.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidArgument` for a path containing a line
    /// break, otherwise as [`send`](Self::send).
    pub fn play_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_string_lossy().into_owned();
        if path.contains(['\n', '\r']) {
            return Err(MediaError::InvalidArgument(path));
        }
        if !self.is_running() {
            return Err(MediaError::NotRunning(self.kind.as_str()));
        }
        self.shared.set_playing(true);
        self.send(MediaCommand::LoadFile(path))
    }

    /// Toggles pause.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn toggle_pause(&mut self) -> Result<()> {
        self.send(MediaCommand::Pause)
    }

    /// Seeks `seconds` forward (or backward if negative).
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn seek_relative(&mut self, seconds: i32) -> Result<()> {
        self.send(MediaCommand::Seek(seconds))
    }

    /// Stops the current clip, leaving the player idle.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn stop(&mut self) -> Result<()> {
        self.send(MediaCommand::Stop)?;
        self.shared.set_playing(false);
        Ok(())
    }

    /// Asks the player to report its position.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn query_position(&mut self) -> Result<()> {
        self.send(MediaCommand::GetTimePos)
    }

    /// Asks the player to report the clip length.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn query_length(&mut self) -> Result<()> {
        self.send(MediaCommand::GetTimeLength)
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    /// Last reported position in seconds; 0 before any report.
    pub fn position(&self) -> u32 {
        self.shared.lock_state().position
    }

    /// Last reported length in seconds; 0 before any report.
    pub fn length(&self) -> u32 {
        self.shared.lock_state().length
    }

    /// Whether a clip is believed to be playing.
    pub fn is_playing(&self) -> bool {
        self.shared.lock_state().playing
    }

    /// Last reported title; empty until reported.
    pub fn title(&self) -> String {
        self.shared.lock_state().title.clone()
    }

    /// Last reported artist; empty until reported.
    pub fn artist(&self) -> String {
        self.shared.lock_state().artist.clone()
    }

    /// Last reported album; empty until reported.
    pub fn album(&self) -> String {
        self.shared.lock_state().album.clone()
    }

    /// Copy of the whole playback state.
    pub fn snapshot(&self) -> PlaybackState {
        self.shared.snapshot()
    }

    /// Registers the event observer, replacing any previous one.
    pub fn set_observer(&self, observer: Arc<dyn PlaybackObserver>) {
        self.shared.set_observer(Some(observer));
    }

    /// Removes the event observer.
    pub fn clear_observer(&self) {
        self.shared.set_observer(None);
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.quit() {
                warn!("[{}] player shutdown on drop failed: {}", self.kind, e);
            }
        }
    }
}

impl fmt::Debug for MediaPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPlayer")
            .field("kind", &self.kind)
            .field("pid", &self.pid())
            .field("quit_timeout", &self.quit_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Writes one command line in a single write, then flushes.
fn write_command(stdin: &mut ChildStdin, command: &MediaCommand) -> io::Result<()> {
    let mut line = command.encode();
    line.push('\n');
    stdin.write_all(line.as_bytes())?;
    stdin.flush()
}

/// Polls the child until it exits or `timeout` elapses.
fn wait_bounded(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}

/// Joins the reader if it finishes within the grace period, else detaches it.
fn join_reader(kind: MediaKind, reader: JoinHandle<()>) {
    let deadline = Instant::now() + READER_JOIN_GRACE;
    while !reader.is_finished() && Instant::now() < deadline {
        thread::sleep(WAIT_POLL_INTERVAL);
    }
    if !reader.is_finished() {
        // Output stays open while a grandchild holds the pipe.
        debug!("[{}] reader still draining, detaching it", kind);
        return;
    }
    if reader.join().is_err() {
        warn!("[{}] reader thread panicked", kind);
    }
}

/// Kills and reaps a child whose session could not be completed.
fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
