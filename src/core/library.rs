//! Story library: registers story sources by key and hands out one shared,
//! lazily loaded story instance per key.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::core::flow::{prepare_story_with, Preparation};
use crate::core::host::{NoHost, SharedHost};
use crate::core::runtime::{DiagnosticPolicy, StoryError, StoryRuntime};
use crate::core::script::{Script, ScriptedStory};
use crate::schema::actor::{ActorProfile, DEFAULT_STORY_KEY};
use crate::schema::config::DialogueConfig;
use crate::schema::value::Value;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("no story registered under key '{0}'")]
    StoryNotFound(String),
    #[error("failed to load story '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: StoryError,
    },
    #[error("failed to prepare story '{key}' for dialogue: {source}")]
    Preparation {
        key: String,
        #[source]
        source: StoryError,
    },
    #[error("story state error for '{key}': {source}")]
    State {
        key: String,
        #[source]
        source: StoryError,
    },
}

/// Where a story's script comes from.
#[derive(Debug, Clone)]
pub enum StorySource {
    File(PathBuf),
    Text(String),
    Script(Script),
}

impl StorySource {
    fn load(&self) -> Result<Script, StoryError> {
        match self {
            Self::File(path) => Script::load_from_ron(path),
            Self::Text(text) => Script::parse_ron(text),
            Self::Script(script) => Ok(script.clone()),
        }
    }
}

/// A loaded story shared between the library and a session.
pub type StoryHandle = Rc<RefCell<ScriptedStory>>;

pub struct StoryLibrary {
    sources: FxHashMap<String, StorySource>,
    stories: FxHashMap<String, StoryHandle>,
    host: SharedHost,
    policy: DiagnosticPolicy,
}

impl std::fmt::Debug for StoryLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryLibrary")
            .field("sources", &self.sources.len())
            .field("loaded", &self.stories.len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for StoryLibrary {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(NoHost)))
    }
}

fn normalize_key(key: &str) -> &str {
    if key.is_empty() {
        DEFAULT_STORY_KEY
    } else {
        key
    }
}

impl StoryLibrary {
    pub fn new(host: SharedHost) -> Self {
        Self {
            sources: FxHashMap::default(),
            stories: FxHashMap::default(),
            host,
            policy: DiagnosticPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DiagnosticPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a library from a config. Story paths are relative to `base_dir`.
    pub fn from_config(config: &DialogueConfig, base_dir: &Path, host: SharedHost) -> Self {
        let mut library = Self::new(host).with_policy(DiagnosticPolicy {
            log_warnings: config.log_story_warnings,
            log_errors: config.log_story_errors,
        });
        for entry in &config.stories {
            library.register(&entry.key, StorySource::File(base_dir.join(&entry.path)));
        }
        library
    }

    /// Register a source under `key`. The first registration of a key wins.
    pub fn register(&mut self, key: &str, source: StorySource) -> bool {
        if key.trim().is_empty() {
            tracing::warn!("story source with an empty key ignored");
            return false;
        }
        if self.sources.contains_key(key) {
            tracing::warn!(key, "duplicate story key, keeping the first registration");
            return false;
        }
        tracing::debug!(key, "story source registered");
        self.sources.insert(key.to_string(), source);
        true
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.sources.contains_key(normalize_key(key))
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.stories.contains_key(normalize_key(key))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    /// The story for `key`, loading it on first request.
    pub fn story(&mut self, key: &str) -> Result<StoryHandle, LibraryError> {
        let key = normalize_key(key);
        if let Some(story) = self.stories.get(key) {
            return Ok(Rc::clone(story));
        }
        let source = self
            .sources
            .get(key)
            .ok_or_else(|| LibraryError::StoryNotFound(key.to_string()))?;
        let script = source.load().map_err(|source| LibraryError::Load {
            key: key.to_string(),
            source,
        })?;
        tracing::info!(key, knots = script.knots.len(), "story loaded");
        let story = Rc::new(RefCell::new(ScriptedStory::with_host(
            script,
            Rc::clone(&self.host),
        )));
        self.stories.insert(key.to_string(), Rc::clone(&story));
        Ok(story)
    }

    /// Fetch the actor's story and select its flow and entry path.
    pub fn prepare_for_dialogue(
        &mut self,
        profile: &ActorProfile,
    ) -> Result<(StoryHandle, Preparation), LibraryError> {
        self.prepare_for_dialogue_with(profile, |_| {})
    }

    /// As [`Self::prepare_for_dialogue`], calling `before_entry` on the story
    /// after the flow switch and before the entry path runs.
    pub fn prepare_for_dialogue_with<F>(
        &mut self,
        profile: &ActorProfile,
        before_entry: F,
    ) -> Result<(StoryHandle, Preparation), LibraryError>
    where
        F: FnOnce(&mut ScriptedStory),
    {
        let key = normalize_key(profile.story_key()).to_string();
        let story = self.story(&key)?;
        let prepared = prepare_story_with(&mut *story.borrow_mut(), profile, before_entry);
        self.report_diagnostics(&key);
        let preparation = prepared.map_err(|source| {
            tracing::error!(key = %key, actor = %profile.name, error = %source, "story preparation failed");
            LibraryError::Preparation {
                key: key.clone(),
                source,
            }
        })?;
        Ok((story, preparation))
    }

    /// Export the runtime state of a loaded story.
    pub fn save_state(&mut self, key: &str) -> Result<String, LibraryError> {
        let key = normalize_key(key);
        let story = self.story(key)?;
        let snapshot = story.borrow().save_state();
        snapshot.map_err(|source| LibraryError::State {
            key: key.to_string(),
            source,
        })
    }

    /// Restore a snapshot. An empty snapshot leaves the story untouched.
    pub fn load_state(&mut self, key: &str, snapshot: &str) -> Result<(), LibraryError> {
        let key = normalize_key(key);
        if snapshot.trim().is_empty() {
            tracing::debug!(key, "empty state snapshot, nothing to load");
            return Ok(());
        }
        let story = self.story(key)?;
        let loaded = story.borrow_mut().load_state(snapshot);
        loaded.map_err(|source| LibraryError::State {
            key: key.to_string(),
            source,
        })
    }

    pub fn variable(&mut self, key: &str, name: &str) -> Result<Option<Value>, LibraryError> {
        let story = self.story(key)?;
        let value = story.borrow().variable(name).cloned();
        Ok(value)
    }

    pub fn set_variable(&mut self, key: &str, name: &str, value: Value) -> Result<(), LibraryError> {
        let key = normalize_key(key);
        let story = self.story(key)?;
        let result = story.borrow_mut().set_variable(name, value);
        result.map_err(|source| LibraryError::State {
            key: key.to_string(),
            source,
        })
    }

    /// Drain a loaded story's diagnostics into the log.
    pub fn report_diagnostics(&self, key: &str) {
        let key = normalize_key(key);
        if let Some(story) = self.stories.get(key) {
            let diagnostics = story.borrow_mut().take_diagnostics();
            self.policy.report(key, &diagnostics);
        }
    }
}
