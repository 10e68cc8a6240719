//! Dialogue configuration, loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::actor::ActorProfile;
use super::speaker::Speaker;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A story source registered under a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAssetEntry {
    pub key: String,
    pub path: PathBuf,
}

/// Top-level dialogue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Speaker title template; `{name}` is replaced by the speaker's name.
    #[serde(default = "default_title_format")]
    pub title_format: String,
    #[serde(default = "default_ended_marker")]
    pub ended_marker: String,
    #[serde(default = "default_closed_marker")]
    pub closed_marker: String,
    /// How many transcript entries a panel shows when it opens.
    #[serde(default = "default_max_history")]
    pub max_history_entries: usize,
    #[serde(default = "default_true")]
    pub log_story_warnings: bool,
    #[serde(default = "default_true")]
    pub log_story_errors: bool,
    /// Echo each conversation's lines and choices to `tracing`.
    #[serde(default = "default_true")]
    pub log_dialogue: bool,
    #[serde(default)]
    pub stories: Vec<StoryAssetEntry>,
    #[serde(default)]
    pub actors: Vec<ActorProfile>,
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_title_format() -> String {
    "=== {name} ===".to_string()
}

fn default_ended_marker() -> String {
    "--- Conversation Ended ---".to_string()
}

fn default_closed_marker() -> String {
    "--- Dialogue Closed by Command ---".to_string()
}

fn default_max_history() -> usize {
    200
}

fn default_true() -> bool {
    true
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            title_format: default_title_format(),
            ended_marker: default_ended_marker(),
            closed_marker: default_closed_marker(),
            max_history_entries: default_max_history(),
            log_story_warnings: true,
            log_story_errors: true,
            log_dialogue: true,
            stories: Vec::new(),
            actors: Vec::new(),
        }
    }
}

impl DialogueConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<DialogueConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a config from a RON string.
    pub fn parse_ron(input: &str) -> Result<DialogueConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Format a speaker title for `name`.
    pub fn title_for(&self, name: &str) -> String {
        self.title_format.replace("{name}", name)
    }

    pub fn player_title(&self) -> String {
        self.title_for(&self.player_name)
    }

    /// Find a configured actor by display name.
    pub fn actor(&self, name: &str) -> Option<&ActorProfile> {
        self.actors.iter().find(|a| a.name == name)
    }
}

/// Resolved speaker titles for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTitles {
    pub player: String,
    pub npc: String,
}

impl SpeakerTitles {
    pub fn new(config: &DialogueConfig, npc_name: &str) -> Self {
        Self {
            player: config.player_title(),
            npc: config.title_for(npc_name),
        }
    }

    pub fn for_speaker(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Player => &self.player,
            Speaker::Npc => &self.npc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::actor::StartOption;

    #[test]
    fn defaults() {
        let config = DialogueConfig::default();
        assert_eq!(config.player_title(), "=== Player ===");
        assert_eq!(config.ended_marker, "--- Conversation Ended ---");
        assert_eq!(config.closed_marker, "--- Dialogue Closed by Command ---");
        assert_eq!(config.max_history_entries, 200);
        assert!(config.log_dialogue);
    }

    #[test]
    fn parse_partial_config() {
        let config = DialogueConfig::parse_ron(
            r#"(
                player_name: "Ash",
                title_format: "<b>{name}</b>",
                log_dialogue: false,
                stories: [(key: "town", path: "town.ron")],
                actors: [(name: "Guard", start_option: AlwaysFromStartPath)],
            )"#,
        )
        .unwrap();
        assert_eq!(config.player_title(), "<b>Ash</b>");
        assert!(!config.log_dialogue);
        assert!(config.log_story_errors);
        assert_eq!(config.stories[0].key, "town");
        assert_eq!(
            config.actor("Guard").map(|a| a.start_option),
            Some(StartOption::AlwaysFromStartPath)
        );
        assert!(config.actor("Nobody").is_none());
        assert!(config.log_story_warnings);
    }

    #[test]
    fn speaker_titles() {
        let titles = SpeakerTitles::new(&DialogueConfig::default(), "Mira");
        assert_eq!(titles.for_speaker(Speaker::Npc), "=== Mira ===");
        assert_eq!(titles.for_speaker(Speaker::Player), "=== Player ===");
    }

    #[test]
    fn load_fixture_config() {
        let path = std::path::PathBuf::from("tests/fixtures/dialogue.ron");
        let config = DialogueConfig::load_from_ron(&path).unwrap();
        assert_eq!(config.stories.len(), 1);
        assert!(config.actor("Mira").is_some());
    }
}
