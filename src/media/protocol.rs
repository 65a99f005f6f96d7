//! Slave-mode protocol spoken with the player subprocess.
//!
//! Commands are single ASCII lines terminated by `\n`. Responses arrive on an
//! unstructured output stream mixed with diagnostic chatter; [`classify`]
//! turns one line into a [`ResponseLine`] and never fails.

use std::fmt;

/// Code delivered with an end-of-track event.
pub const END_OF_TRACK_CODE: i32 = 1;

const POSITION_PREFIX: &str = "ANS_TIME_POSITION=";
const LENGTH_PREFIXES: [&str; 2] = ["ANS_TIME_LENGTH=", "ANS_LENGTH="];
const END_OF_CLIP_MARKER: &str = "EOF code: 0";

// ============================================================================
// MediaCommand
// ============================================================================

/// A command sent to the player's input pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCommand {
    /// Load and start a file, replacing the current one.
    LoadFile(String),
    /// Toggle pause.
    Pause,
    /// Seek relative to the current position, in seconds.
    Seek(i32),
    /// Stop playback, keeping the player idle.
    Stop,
    /// Ask for the current position.
    GetTimePos,
    /// Ask for the clip length.
    GetTimeLength,
    /// Exit the player.
    Quit,
}

impl MediaCommand {
    /// Encodes the command as a protocol line without the terminator.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::LoadFile(path) => format!("loadfile \"{}\" 0", quote_escape(path)),
            Self::Pause => "pause".to_string(),
            Self::Seek(seconds) => format!("seek {} 0", seconds),
            Self::Stop => "stop".to_string(),
            Self::GetTimePos => "get_time_pos".to_string(),
            Self::GetTimeLength => "get_time_length".to_string(),
            Self::Quit => "quit".to_string(),
        }
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Escapes backslashes and double quotes inside a quoted argument.
fn quote_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// ResponseLine
// ============================================================================

/// Classification of one output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// Position report, in whole seconds.
    Position(u32),
    /// Length report, in whole seconds.
    Length(u32),
    /// Title metadata.
    Title(String),
    /// Artist metadata.
    Artist(String),
    /// Album metadata.
    Album(String),
    /// The clip finished normally.
    EndOfTrack,
    /// Anything else; discarded by the reader.
    Unrecognized,
}

/// Classifies one line of player output.
///
/// Checks run in a fixed order: position prefix, length prefix, album,
/// artist and title markers, then the end-of-clip marker. Metadata markers
/// match case-insensitively anywhere in the line; the value is whatever
/// follows the line's first colon, leading blanks and the line terminator
/// removed.
pub fn classify(line: &str) -> ResponseLine {
    if let Some(rest) = line.strip_prefix(POSITION_PREFIX) {
        return parse_seconds(rest).map_or(ResponseLine::Unrecognized, ResponseLine::Position);
    }
    for prefix in LENGTH_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return parse_seconds(rest).map_or(ResponseLine::Unrecognized, ResponseLine::Length);
        }
    }

    let upper = line.to_ascii_uppercase();
    if upper.contains("ALBUM:") {
        return ResponseLine::Album(field_value(line));
    }
    if upper.contains("ARTIST:") {
        return ResponseLine::Artist(field_value(line));
    }
    if upper.contains("TITLE:") {
        return ResponseLine::Title(field_value(line));
    }

    if line.contains(END_OF_CLIP_MARKER) {
        return ResponseLine::EndOfTrack;
    }
    ResponseLine::Unrecognized
}

/// Returns the text after the first colon, trimmed like a metadata value.
fn field_value(line: &str) -> String {
    let value = line.split_once(':').map_or("", |(_, value)| value);
    value
        .trim_start_matches([' ', '\t'])
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Reads the leading number of a report, truncated to whole seconds.
///
/// Fractions truncate toward zero and negative values clamp to zero. Returns
/// `None` if the text does not start with a number.
fn parse_seconds(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    let value: f64 = text[..end].parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    // `as` saturates: negatives become 0, huge values u32::MAX.
    Some(value.trunc() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Command Encoding Tests
    // ------------------------------------------------------------------------

    mod command_tests {
        use super::*;

        #[test]
        fn test_loadfile_is_quoted() {
            let cmd = MediaCommand::LoadFile("/music/My Song.mp3".to_string());
            assert_eq!(cmd.encode(), "loadfile \"/music/My Song.mp3\" 0");
        }

        #[test]
        fn test_loadfile_escapes_quotes() {
            let cmd = MediaCommand::LoadFile(r#"/music/"live".mp3"#.to_string());
            assert_eq!(cmd.encode(), r#"loadfile "/music/\"live\".mp3" 0"#);
        }

        #[test]
        fn test_seek_sign() {
            assert_eq!(MediaCommand::Seek(10).encode(), "seek 10 0");
            assert_eq!(MediaCommand::Seek(-5).encode(), "seek -5 0");
        }

        #[test]
        fn test_simple_commands() {
            assert_eq!(MediaCommand::Pause.encode(), "pause");
            assert_eq!(MediaCommand::Quit.encode(), "quit");
            assert_eq!(MediaCommand::Stop.encode(), "stop");
            assert_eq!(MediaCommand::GetTimePos.encode(), "get_time_pos");
            assert_eq!(MediaCommand::GetTimeLength.to_string(), "get_time_length");
        }
    }

    // ------------------------------------------------------------------------
    // Classifier Tests
    // ------------------------------------------------------------------------

    mod classify_tests {
        use super::*;

        #[test]
        fn test_position() {
            assert_eq!(classify("ANS_TIME_POSITION=42"), ResponseLine::Position(42));
            assert_eq!(classify("ANS_TIME_POSITION=42.9\n"), ResponseLine::Position(42));
            assert_eq!(classify("ANS_TIME_POSITION=-1.0"), ResponseLine::Position(0));
        }

        #[test]
        fn test_length() {
            assert_eq!(classify("ANS_TIME_LENGTH=180"), ResponseLine::Length(180));
            assert_eq!(classify("ANS_LENGTH=215.35\n"), ResponseLine::Length(215));
        }

        #[test]
        fn test_malformed_number_is_unrecognized() {
            assert_eq!(classify("ANS_TIME_POSITION=abc"), ResponseLine::Unrecognized);
            assert_eq!(classify("ANS_TIME_LENGTH="), ResponseLine::Unrecognized);
        }

        #[test]
        fn test_metadata_uppercase_markers() {
            assert_eq!(
                classify("TITLE: Morning Song\n"),
                ResponseLine::Title("Morning Song".to_string())
            );
            assert_eq!(
                classify("ARTIST:\tThe Band\r\n"),
                ResponseLine::Artist("The Band".to_string())
            );
            assert_eq!(
                classify("ALBUM: Dawn"),
                ResponseLine::Album("Dawn".to_string())
            );
        }

        #[test]
        fn test_metadata_clip_info_format() {
            assert_eq!(
                classify(" Title: Morning Song\n"),
                ResponseLine::Title("Morning Song".to_string())
            );
            assert_eq!(
                classify(" Artist: The Band\n"),
                ResponseLine::Artist("The Band".to_string())
            );
        }

        #[test]
        fn test_metadata_value_keeps_later_colons() {
            assert_eq!(
                classify("Title: Part 1: Intro"),
                ResponseLine::Title("Part 1: Intro".to_string())
            );
        }

        #[test]
        fn test_album_checked_before_artist() {
            assert_eq!(
                classify("Album: Artist: Collected"),
                ResponseLine::Album("Artist: Collected".to_string())
            );
        }

        #[test]
        fn test_empty_metadata_value() {
            assert_eq!(classify("TITLE:\n"), ResponseLine::Title(String::new()));
        }

        #[test]
        fn test_end_of_track() {
            assert_eq!(classify("EOF code: 0  \n"), ResponseLine::EndOfTrack);
            assert_eq!(classify("\nEOF code: 0"), ResponseLine::EndOfTrack);
            assert_eq!(classify("EOF code: 4"), ResponseLine::Unrecognized);
        }

        #[test]
        fn test_chatter_is_unrecognized() {
            for line in [
                "",
                "\n",
                "MPlayer SVN-r38151 (C) 2000-2019 MPlayer Team",
                "Playing /tmp/x.mp3.",
                "AO: [oss] 44100Hz 2ch s16le (2 bytes per sample)",
                "ANS_PERCENT_POSITION=12",
            ] {
                assert_eq!(classify(line), ResponseLine::Unrecognized, "line {:?}", line);
            }
        }

        #[test]
        fn test_position_prefix_must_start_line() {
            assert_eq!(
                classify("echo ANS_TIME_POSITION=5"),
                ResponseLine::Unrecognized
            );
        }
    }
}
