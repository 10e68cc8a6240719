//! Per-actor conversation history.

use serde::{Deserialize, Serialize};

use super::speaker::Speaker;

/// One block of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// `None` for marker entries such as "conversation ended".
    pub speaker: Option<Speaker>,
    pub title: Option<String>,
    pub text: String,
}

impl TranscriptEntry {
    pub fn includes_title(&self) -> bool {
        self.title.is_some()
    }

    /// Render as the panel shows it: `title\ntext`, or just `text`.
    pub fn render(&self) -> String {
        match &self.title {
            Some(title) => format!("{}\n{}", title, self.text),
            None => self.text.clone(),
        }
    }
}

/// Ordered history of dialogue blocks with one actor.
///
/// A block carries its speaker title only when the previous entry belongs
/// to a different speaker (or there is no previous entry).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a block from `speaker` appended now would carry a title.
    pub fn needs_title(&self, speaker: Speaker) -> bool {
        match self.entries.last() {
            Some(last) => last.speaker != Some(speaker),
            None => true,
        }
    }

    /// Append a speaker block, titling it per the suppression rule.
    /// Returns whether the title was included.
    pub fn record_block(&mut self, speaker: Speaker, title: &str, text: &str) -> bool {
        let include_title = self.needs_title(speaker);
        self.append_entry(TranscriptEntry {
            speaker: Some(speaker),
            title: include_title.then(|| title.to_string()),
            text: text.to_string(),
        });
        include_title
    }

    /// Append a speakerless marker line.
    pub fn append_marker(&mut self, marker: &str) {
        self.append_entry(TranscriptEntry {
            speaker: None,
            title: None,
            text: marker.to_string(),
        });
    }

    pub fn append_entry(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Whether the rendered last entry begins with `title`.
    pub fn last_entry_starts_with_title(&self, title: &str) -> bool {
        self.entries
            .last()
            .is_some_and(|entry| entry.render().starts_with(title))
    }

    /// The most recent `count` entries, oldest first.
    pub fn tail(&self, count: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NPC_TITLE: &str = "=== Mira ===";
    const PLAYER_TITLE: &str = "=== Player ===";

    #[test]
    fn first_block_is_titled() {
        let mut t = Transcript::new();
        assert!(t.record_block(Speaker::Npc, NPC_TITLE, "Hello."));
        assert_eq!(t.entries()[0].render(), "=== Mira ===\nHello.");
    }

    #[test]
    fn same_speaker_suppresses_title() {
        let mut t = Transcript::new();
        t.record_block(Speaker::Npc, NPC_TITLE, "Hello.");
        assert!(!t.record_block(Speaker::Npc, NPC_TITLE, "Again."));
        assert_eq!(t.entries()[1].render(), "Again.");
        assert!(t.record_block(Speaker::Player, PLAYER_TITLE, "Hi."));
        assert!(t.record_block(Speaker::Npc, NPC_TITLE, "Back to me."));
    }

    #[test]
    fn marker_resets_title_suppression() {
        let mut t = Transcript::new();
        t.record_block(Speaker::Npc, NPC_TITLE, "Bye.");
        t.append_marker("--- Conversation Ended ---");
        assert!(t.needs_title(Speaker::Npc));
        assert!(!t.last_entry_starts_with_title(NPC_TITLE));
    }

    #[test]
    fn last_entry_title_prefix() {
        let mut t = Transcript::new();
        assert!(!t.last_entry_starts_with_title(NPC_TITLE));
        t.record_block(Speaker::Npc, NPC_TITLE, "Hello.");
        assert!(t.last_entry_starts_with_title(NPC_TITLE));
        t.record_block(Speaker::Npc, NPC_TITLE, "More.");
        assert!(!t.last_entry_starts_with_title(NPC_TITLE));
    }

    #[test]
    fn tail_returns_most_recent() {
        let mut t = Transcript::new();
        for i in 0..5 {
            t.append_marker(&format!("m{}", i));
        }
        let tail = t.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].text, "m3");
        assert_eq!(t.tail(10).len(), 5);
        assert_eq!(t.entry_count(), 5);
    }
}
