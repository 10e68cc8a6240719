//! Plain-text log of the current dialogue session.

use crate::core::events::SessionEvent;

/// Collects the lines and choices of one dialogue session.
#[derive(Debug, Clone)]
pub struct DialogueLog {
    echo: bool,
    player_name: String,
    lines: Vec<String>,
}

impl Default for DialogueLog {
    fn default() -> Self {
        Self::new("Player")
    }
}

impl DialogueLog {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            echo: true,
            player_name: player_name.into(),
            lines: Vec::new(),
        }
    }

    /// Whether entries are also echoed to `tracing`.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn is_echoing(&self) -> bool {
        self.echo
    }

    pub fn start_session(&mut self) {
        self.lines.clear();
        if self.echo {
            tracing::info!("dialogue log session started");
        }
    }

    pub fn log_line(&mut self, line: &str) {
        if self.echo {
            tracing::info!(target: "dialogue", "{}", line);
        }
        self.lines.push(line.to_string());
    }

    pub fn log_choice(&mut self, speaker: &str, text: &str) {
        if self.echo {
            tracing::info!(target: "dialogue", "> {}", text);
        }
        self.lines.push(format!("{} chooses: {}", speaker, text));
    }

    /// Record whatever part of `event` belongs in the log.
    pub fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ContentAvailable(block) => self.log_line(&block.formatted()),
            SessionEvent::ChoiceMade { text, .. } => {
                let speaker = self.player_name.clone();
                self.log_choice(&speaker, text);
            }
            _ => {}
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The session so far, one entry per line.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Close the session, echoing the full transcript.
    pub fn finish_session(&mut self) -> String {
        let transcript = self.transcript();
        if self.echo {
            tracing::info!(entries = self.lines.len(), "dialogue log session ended");
            tracing::debug!(target: "dialogue", "\n{}", transcript);
        }
        transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::ContentBlock;
    use crate::schema::speaker::Speaker;

    #[test]
    fn records_content_and_choices() {
        let mut log = DialogueLog::new("Ash").with_echo(false);
        log.start_session();
        log.record(&SessionEvent::ContentAvailable(ContentBlock {
            speaker: Speaker::Npc,
            title: Some("=== Mira ===".to_string()),
            text: "Hello".to_string(),
        }));
        log.record(&SessionEvent::ChoiceMade {
            index: 0,
            text: "Hi".to_string(),
        });
        log.record(&SessionEvent::StoryComplete);
        assert_eq!(log.lines(), ["=== Mira ===\nHello", "Ash chooses: Hi"]);
        assert_eq!(log.finish_session(), "=== Mira ===\nHello\nAsh chooses: Hi\n");
    }

    #[test]
    fn start_clears_previous_session() {
        let mut log = DialogueLog::default().with_echo(false);
        log.log_line("old");
        log.start_session();
        assert!(log.lines().is_empty());
        assert_eq!(log.transcript(), "");
    }
}
