//! The script-engine seam the dialogue session drives.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Name of the flow every story starts in.
pub const DEFAULT_FLOW_NAME: &str = "DEFAULT";

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("unknown path '{0}'")]
    UnknownPath(String),
    #[error("invalid flow name '{0}'")]
    InvalidFlowName(String),
    #[error("flow '{0}' does not exist")]
    UnknownFlow(String),
    #[error("the default flow cannot be removed")]
    RemoveDefaultFlow,
    #[error("story cannot continue")]
    CannotContinue,
    #[error("choice index {index} out of range ({count} available)")]
    ChoiceOutOfRange { index: usize, count: usize },
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("malformed script: {0}")]
    Malformed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
}

/// A choice offered by the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryChoice {
    pub text: String,
}

/// How serious a script-engine diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal report from the script engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Which diagnostics get forwarded to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticPolicy {
    pub log_warnings: bool,
    pub log_errors: bool,
}

impl Default for DiagnosticPolicy {
    fn default() -> Self {
        Self {
            log_warnings: true,
            log_errors: true,
        }
    }
}

impl DiagnosticPolicy {
    /// Forward diagnostics to `tracing` per this policy.
    pub fn report(&self, story_key: &str, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Warning if self.log_warnings => {
                    tracing::warn!(story = story_key, "story warning: {}", diagnostic.message)
                }
                Severity::Error if self.log_errors => {
                    tracing::error!(story = story_key, "story error: {}", diagnostic.message)
                }
                _ => {}
            }
        }
    }
}

/// A narrative-script interpreter.
///
/// Yields lines one at a time, offers choices when linear content runs out,
/// and keeps independently resumable named flows.
pub trait StoryRuntime {
    /// Whether `continue_line` would yield another line right now.
    fn can_continue(&self) -> bool;

    /// Advance and return the next line. Only valid when `can_continue`.
    fn continue_line(&mut self) -> Result<String, StoryError>;

    fn current_choices(&self) -> Vec<StoryChoice>;

    fn choose_choice(&mut self, index: usize) -> Result<(), StoryError>;

    fn current_flow_name(&self) -> &str;

    fn current_flow_is_default(&self) -> bool {
        self.is_default_flow(self.current_flow_name())
    }

    /// Whether `name` refers to the default flow. Empty names do.
    fn is_default_flow(&self, name: &str) -> bool {
        name.is_empty() || name == DEFAULT_FLOW_NAME
    }

    /// Whether `name` already holds recorded execution state.
    fn is_flow_alive(&self, name: &str) -> bool;

    fn switch_flow(&mut self, name: &str) -> Result<(), StoryError>;

    fn switch_to_default_flow(&mut self) -> Result<(), StoryError>;

    fn remove_flow(&mut self, name: &str) -> Result<(), StoryError>;

    /// Wipe all flows and variables back to their initial state.
    fn reset_state(&mut self) -> Result<(), StoryError>;

    /// Point the current flow at an entry path.
    fn choose_path(&mut self, path: &str) -> Result<(), StoryError>;

    /// Drain pending diagnostics. Engines without any report none.
    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

impl std::fmt::Debug for dyn StoryRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryRuntime")
            .field("flow", &self.current_flow_name())
            .field("can_continue", &self.can_continue())
            .finish()
    }
}

/// Shared, single-threaded handle to a script engine.
pub type SharedStory = Rc<RefCell<dyn StoryRuntime>>;
