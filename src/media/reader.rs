//! Background consumer of the player's output stream.
//!
//! One thread per session reads newline-delimited output until end of stream,
//! classifies each line and folds it into the shared state. It blocks only on
//! the pipe read and holds no lock while doing so.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use super::events::PlaybackEvent;
use super::protocol::{classify, ResponseLine};
use super::state::SessionShared;
use super::MediaKind;

/// Longest chunk treated as one line; longer lines are split.
const MAX_LINE_BYTES: u64 = 4096;

/// Starts the reader thread for one session.
pub(crate) fn spawn_reader<R>(
    kind: MediaKind,
    output: R,
    shared: Arc<SessionShared>,
) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{}-player-reader", kind.as_str()))
        .spawn(move || read_responses(kind, output, &shared))
}

/// Drains `output` until end of stream, updating `shared`.
///
/// On end of stream the playing flag is cleared and a
/// [`PlaybackEvent::ProcessExited`] is delivered.
pub(crate) fn read_responses<R: Read>(kind: MediaKind, output: R, shared: &SessionShared) {
    let mut reader = BufReader::new(output);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match (&mut reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                handle_line(kind, &line, shared);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("[{}] output read failed: {}", kind, e);
                break;
            }
        }
    }

    debug!("[{}] player output closed", kind);
    shared.set_playing(false);
    shared.notify(PlaybackEvent::ProcessExited);
}

fn handle_line(kind: MediaKind, line: &str, shared: &SessionShared) {
    let response = classify(line);
    if response == ResponseLine::Unrecognized {
        trace!("[{}] {}", kind, line.trim_end());
        return;
    }
    debug!("[{}] {:?}", kind, response);
    if let Some(event) = shared.apply(response) {
        shared.notify(event);
    }
}
