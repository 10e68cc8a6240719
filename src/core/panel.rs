//! Presentation model of the dialogue panel.
//!
//! Mirrors what a UI layer does with session events, without any UI: the
//! visible text, the offered choices and whether the close button shows.

use crate::core::events::{ChoiceView, SessionEvent};
use crate::schema::transcript::Transcript;

/// What the host UI should do after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    Close,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialoguePanel {
    append_mode: bool,
    text: String,
    choices: Vec<ChoiceView>,
    close_visible: bool,
}

impl DialoguePanel {
    /// Open a panel. Append mode starts from the last `max_history`
    /// transcript entries; replace mode starts blank.
    pub fn open(transcript: &Transcript, append_mode: bool, max_history: usize) -> Self {
        let text = if append_mode {
            transcript
                .tail(max_history)
                .iter()
                .map(|entry| entry.render())
                .collect::<Vec<_>>()
                .join("\n\n")
        } else {
            String::new()
        };
        Self {
            append_mode,
            text,
            choices: Vec::new(),
            close_visible: false,
        }
    }

    pub fn apply(&mut self, event: &SessionEvent) -> PanelAction {
        match event {
            SessionEvent::ContentAvailable(block) => {
                let formatted = block.formatted();
                if formatted.is_empty() {
                    return PanelAction::None;
                }
                if self.append_mode {
                    if !self.text.is_empty() {
                        self.text.push_str("\n\n");
                    }
                    self.text.push_str(&formatted);
                } else {
                    self.text = formatted;
                }
            }
            SessionEvent::ChoicesAvailable(choices) => {
                self.clear_controls();
                if self.append_mode && !self.text.is_empty() {
                    self.text.push('\n');
                }
                self.choices = choices.clone();
            }
            SessionEvent::StoryComplete => {
                self.clear_controls();
                self.close_visible = true;
            }
            SessionEvent::CloseRequested => return PanelAction::Close,
            SessionEvent::ChoiceMade { .. } => {}
        }
        PanelAction::None
    }

    /// Take the choice at `index` off the panel. Returns the index to
    /// forward to the session, or `None` if no such choice is shown.
    pub fn pick(&mut self, index: usize) -> Option<usize> {
        let picked = self.choices.iter().position(|c| c.index == index)?;
        let index = self.choices[picked].index;
        self.clear_controls();
        Some(index)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn choices(&self) -> &[ChoiceView] {
        &self.choices
    }

    pub fn close_visible(&self) -> bool {
        self.close_visible
    }

    pub fn is_append_mode(&self) -> bool {
        self.append_mode
    }

    fn clear_controls(&mut self) {
        self.choices.clear();
        self.close_visible = false;
    }
}
