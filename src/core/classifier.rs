//! Line classification: commands, player speech and NPC speech.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::speaker::Speaker;

/// Marker that introduces an inline command line.
pub const COMMAND_MARKER: &str = ">>>";

static PLAYER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*p:\s?").expect("valid player prefix regex"));

/// A raw script line, tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Command body after the marker, trimmed.
    Command(&'a str),
    /// Dialogue content with any player marker removed. Not trimmed.
    Dialogue { speaker: Speaker, content: &'a str },
}

/// An inline command recognised by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `close` or `close_dialogue`, any case.
    Close,
    Unknown(String),
}

impl Command {
    pub fn parse(body: &str) -> Command {
        let body = body.trim();
        if body.eq_ignore_ascii_case("close_dialogue") || body.eq_ignore_ascii_case("close") {
            Command::Close
        } else {
            Command::Unknown(body.to_string())
        }
    }
}

/// Classify a raw line from the script engine.
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(body) = line.trim_start().strip_prefix(COMMAND_MARKER) {
        return LineKind::Command(body.trim());
    }
    match PLAYER_PREFIX.find(line) {
        Some(m) => LineKind::Dialogue {
            speaker: Speaker::Player,
            content: &line[m.end()..],
        },
        None => LineKind::Dialogue {
            speaker: Speaker::Npc,
            content: line,
        },
    }
}

/// Whether the line opens with the player-speech marker.
pub fn has_player_prefix(line: &str) -> bool {
    PLAYER_PREFIX.is_match(line)
}

/// Remove one leading player-speech marker; other lines are returned as-is.
pub fn strip_player_prefix(line: &str) -> &str {
    match PLAYER_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npc_line_unmodified() {
        assert_eq!(
            classify("Hello there."),
            LineKind::Dialogue {
                speaker: Speaker::Npc,
                content: "Hello there."
            }
        );
    }

    #[test]
    fn player_prefix_stripped_once() {
        assert_eq!(
            classify("p: I am fine"),
            LineKind::Dialogue {
                speaker: Speaker::Player,
                content: "I am fine"
            }
        );
        assert_eq!(strip_player_prefix("  p:no space"), "no space");
        assert_eq!(strip_player_prefix("p:  two spaces"), " two spaces");
        assert_eq!(strip_player_prefix("p: p: twice"), "p: twice");
    }

    #[test]
    fn mid_line_marker_ignored() {
        assert!(!has_player_prefix("He said p: nothing"));
        assert_eq!(strip_player_prefix("He said p: nothing"), "He said p: nothing");
    }

    #[test]
    fn prefix_is_case_sensitive() {
        assert!(!has_player_prefix("P: shouting"));
        assert!(matches!(
            classify("P: shouting"),
            LineKind::Dialogue { speaker: Speaker::Npc, .. }
        ));
    }

    #[test]
    fn command_detection() {
        assert_eq!(classify(">>> close"), LineKind::Command("close"));
        assert_eq!(classify("   >>>CLOSE_DIALOGUE  "), LineKind::Command("CLOSE_DIALOGUE"));
        // commands are never speaker-classified
        assert_eq!(classify(">>> p: hi"), LineKind::Command("p: hi"));
    }

    #[test]
    fn command_parsing() {
        assert_eq!(Command::parse("close"), Command::Close);
        assert_eq!(Command::parse(" Close_Dialogue "), Command::Close);
        assert_eq!(
            Command::parse("give_gold 5"),
            Command::Unknown("give_gold 5".to_string())
        );
    }

    #[test]
    fn empty_player_line() {
        assert_eq!(
            classify("p:"),
            LineKind::Dialogue {
                speaker: Speaker::Player,
                content: ""
            }
        );
    }
}
