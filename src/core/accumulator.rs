//! Content accumulator: coalesces same-speaker lines into blocks.

use crate::schema::speaker::Speaker;

/// A completed block of same-speaker content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub speaker: Speaker,
    pub text: String,
    /// Whether the presentation layer needs the speaker title again.
    pub show_title: bool,
}

/// Buffers dialogue lines until the speaker changes or the caller flushes.
///
/// The owning speaker survives a flush, so content that follows from the
/// same speaker continues the block without reopening a title.
#[derive(Debug, Clone, Default)]
pub struct ContentAccumulator {
    lines: Vec<String>,
    speaker: Option<Speaker>,
    last_rendered: Option<Speaker>,
}

impl ContentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line of content from `speaker`.
    ///
    /// Returns the previous block if the speaker change closed it.
    /// Whitespace-only text becomes a paragraph break inside an open block
    /// and is dropped otherwise.
    pub fn append(&mut self, speaker: Speaker, text: &str) -> Option<Block> {
        let text = text.trim();
        if text.is_empty() {
            if !self.lines.is_empty() {
                self.lines.push(String::new());
            }
            return None;
        }

        let mut closed = None;
        let speaker_changed = matches!(self.speaker, Some(current) if current != speaker);
        if self.lines.is_empty() || speaker_changed {
            closed = self.flush(false);
            self.speaker = Some(speaker);
        }
        self.lines.push(text.to_string());
        closed
    }

    /// Close the buffered block, if there is one.
    ///
    /// With `force`, the buffer is emptied even when nothing was produced.
    pub fn flush(&mut self, force: bool) -> Option<Block> {
        if let (false, Some(speaker)) = (self.lines.is_empty(), self.speaker) {
            let block = Block {
                speaker,
                text: self.lines.join("\n"),
                show_title: self.last_rendered != Some(speaker),
            };
            self.lines.clear();
            self.last_rendered = Some(speaker);
            return Some(block);
        }
        if force {
            self.lines.clear();
        }
        None
    }

    pub fn speaker(&self) -> Option<Speaker> {
        self.speaker
    }

    pub fn set_speaker(&mut self, speaker: Option<Speaker>) {
        self.speaker = speaker;
    }

    /// The speaker of the last block handed to the presentation layer.
    pub fn last_rendered(&self) -> Option<Speaker> {
        self.last_rendered
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Forget both speaker trackers; the buffer is left alone.
    pub fn reset_speakers(&mut self) {
        self.speaker = None;
        self.last_rendered = None;
    }

    /// Drop buffered content and speaker tracking.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.reset_speakers();
    }
}
