//! Actor identity: per-NPC dialogue configuration and conversation state.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use super::transcript::Transcript;

/// Story key used when an actor does not name one.
pub const DEFAULT_STORY_KEY: &str = "default";

/// Entry path used when no start path can be derived from the actor's name.
pub const DEFAULT_START_PATH: &str = "default_start";

static NON_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]+").expect("valid identifier regex"));
static UNDERSCORE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("valid underscore regex"));

/// How a dialogue session with an actor begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StartOption {
    /// Continue from where this actor's flow left off.
    #[default]
    Continue,
    /// Continue, and discard the flow when the story thread ends so the
    /// next conversation starts from the start path again.
    ContinueAndLoop,
    /// Always jump to the start path.
    AlwaysFromStartPath,
    /// Reset the whole story state (all flows, all variables) first.
    AlwaysResetStory,
}

/// Static dialogue configuration for one conversational partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    /// Display name, also used for the speaker title.
    pub name: String,
    /// Stable unique id, exported to the script as `npc_id`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub story_key: String,
    #[serde(default)]
    pub flow_name: String,
    #[serde(default)]
    pub start_path: String,
    #[serde(default)]
    pub start_option: StartOption,
    /// Accumulate text in the panel (true) or replace it per block (false).
    #[serde(default = "default_append")]
    pub append_dialogue: bool,
}

fn default_append() -> bool {
    true
}

impl ActorProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            story_key: String::new(),
            flow_name: String::new(),
            start_path: String::new(),
            start_option: StartOption::Continue,
            append_dialogue: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_story_key(mut self, key: impl Into<String>) -> Self {
        self.story_key = key.into();
        self
    }

    pub fn with_flow_name(mut self, flow: impl Into<String>) -> Self {
        self.flow_name = flow.into();
        self
    }

    pub fn with_start_path(mut self, path: impl Into<String>) -> Self {
        self.start_path = path.into();
        self
    }

    pub fn with_start_option(mut self, option: StartOption) -> Self {
        self.start_option = option;
        self
    }

    pub fn with_append_dialogue(mut self, append: bool) -> Self {
        self.append_dialogue = append;
        self
    }

    /// The story this actor talks from; empty means [`DEFAULT_STORY_KEY`].
    pub fn story_key(&self) -> &str {
        if self.story_key.is_empty() {
            DEFAULT_STORY_KEY
        } else {
            &self.story_key
        }
    }

    /// The flow this actor's conversation runs in, defaulting to the
    /// display name.
    pub fn flow_name(&self) -> &str {
        if self.flow_name.is_empty() {
            &self.name
        } else {
            &self.flow_name
        }
    }

    /// The entry path, defaulting to one derived from the display name.
    pub fn start_path(&self) -> String {
        if self.start_path.is_empty() {
            derive_start_path(&self.name)
        } else {
            self.start_path.clone()
        }
    }
}

/// Derive an entry path from a display name.
///
/// Lowercases the name, collapses every run of characters outside
/// `[a-z0-9_]` into a single underscore, trims underscores from both ends
/// and appends `_start`. Falls back to [`DEFAULT_START_PATH`].
pub fn derive_start_path(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = NON_IDENT.replace_all(&lowered, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    let slug = collapsed.trim_matches('_');
    if slug.is_empty() {
        DEFAULT_START_PATH.to_string()
    } else {
        format!("{}_start", slug)
    }
}

/// An actor's profile together with its conversation history.
///
/// The transcript outlives individual sessions; it is lost on process exit
/// unless the caller serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub profile: ActorProfile,
    #[serde(default)]
    pub transcript: Transcript,
}

/// Shared, single-threaded handle to an actor.
pub type ActorHandle = Rc<RefCell<Actor>>;

impl Actor {
    pub fn new(profile: ActorProfile) -> Self {
        Self {
            profile,
            transcript: Transcript::new(),
        }
    }

    pub fn into_handle(self) -> ActorHandle {
        Rc::new(RefCell::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_simple_name() {
        assert_eq!(derive_start_path("Bob"), "bob_start");
    }

    #[test]
    fn derive_collapses_punctuation() {
        assert_eq!(derive_start_path("Old Man  Jenkins!"), "old_man_jenkins_start");
        assert_eq!(derive_start_path("__Mira--the__Smith__"), "mira_the_smith_start");
    }

    #[test]
    fn derive_fallback_when_empty() {
        assert_eq!(derive_start_path(""), DEFAULT_START_PATH);
        assert_eq!(derive_start_path("???"), DEFAULT_START_PATH);
    }

    #[test]
    fn profile_defaults() {
        let profile = ActorProfile::new("Tavern Keeper");
        assert_eq!(profile.story_key(), DEFAULT_STORY_KEY);
        assert_eq!(profile.flow_name(), "Tavern Keeper");
        assert_eq!(profile.start_path(), "tavern_keeper_start");
        assert_eq!(profile.start_option, StartOption::Continue);
        assert!(profile.append_dialogue);
    }

    #[test]
    fn profile_overrides() {
        let profile = ActorProfile::new("Guard")
            .with_story_key("town")
            .with_flow_name("guard_flow")
            .with_start_path("gate.challenge");
        assert_eq!(profile.story_key(), "town");
        assert_eq!(profile.flow_name(), "guard_flow");
        assert_eq!(profile.start_path(), "gate.challenge");
    }

    #[test]
    fn profile_from_ron() {
        let profile: ActorProfile = ron::from_str(
            r#"(name: "Mira", start_option: ContinueAndLoop, append_dialogue: false)"#,
        )
        .unwrap();
        assert_eq!(profile.name, "Mira");
        assert_eq!(profile.start_option, StartOption::ContinueAndLoop);
        assert!(!profile.append_dialogue);
        assert!(profile.id.is_none());
    }
}
