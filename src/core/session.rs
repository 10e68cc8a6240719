//! Dialogue session: drives one conversation through the script engine.
//!
//! A session pulls lines from the story, groups them into speaker blocks,
//! dispatches inline commands, offers choices and records everything to the
//! actor's transcript. It runs synchronously: each call to
//! [`DialogueSession::begin_processing`] or [`DialogueSession::select_choice`]
//! returns once the story is waiting for a choice or the thread is over.

use thiserror::Error;

use crate::core::accumulator::{Block, ContentAccumulator};
use crate::core::classifier::{classify, strip_player_prefix, Command, LineKind};
use crate::core::events::{ChoiceView, ContentBlock, Observers, SessionEvent, SubscriptionId};
use crate::core::runtime::{SharedStory, StoryError};
use crate::schema::actor::{ActorHandle, ActorProfile, StartOption};
use crate::schema::config::{DialogueConfig, SpeakerTitles};
use crate::schema::speaker::Speaker;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,
    #[error("session has been disposed")]
    Disposed,
    #[error("session is not awaiting a choice (state: {0:?})")]
    NotAwaitingChoice(SessionState),
    #[error("choice index {index} out of range ({count} available)")]
    ChoiceOutOfRange { index: usize, count: usize },
    #[error("story error: {0}")]
    Story(#[from] StoryError),
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, waiting for the presentation layer to be ready.
    Idle,
    Processing,
    AwaitingChoice,
    /// The story thread ran out of content and choices.
    Completed,
    /// A close command ended the conversation.
    ForceClosed,
    /// The story engine failed mid-conversation.
    Aborted,
    Disposed,
}

/// One conversation between the player and an actor.
#[derive(Debug)]
pub struct DialogueSession {
    story: SharedStory,
    actor: ActorHandle,
    profile: ActorProfile,
    titles: SpeakerTitles,
    ended_marker: String,
    closed_marker: String,
    accumulator: ContentAccumulator,
    state: SessionState,
    observers: Observers,
}

impl DialogueSession {
    /// Create a session; nothing runs until [`Self::begin_processing`].
    pub fn new(story: SharedStory, actor: ActorHandle, config: &DialogueConfig) -> Self {
        let profile = actor.borrow().profile.clone();
        let titles = SpeakerTitles::new(config, &profile.name);
        Self {
            story,
            actor,
            profile,
            titles,
            ended_marker: config.ended_marker.clone(),
            closed_marker: config.closed_marker.clone(),
            accumulator: ContentAccumulator::new(),
            state: SessionState::Idle,
            observers: Observers::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True between beginning and completion or forced closure.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Processing | SessionState::AwaitingChoice
        )
    }

    pub fn is_disposed(&self) -> bool {
        self.state == SessionState::Disposed
    }

    pub fn actor(&self) -> &ActorHandle {
        &self.actor
    }

    pub fn profile(&self) -> &ActorProfile {
        &self.profile
    }

    pub fn titles(&self) -> &SpeakerTitles {
        &self.titles
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Start driving the story. Valid once, from `Idle`.
    pub fn begin_processing(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Disposed => return Err(SessionError::Disposed),
            SessionState::Idle => {}
            _ => return Err(SessionError::AlreadyStarted),
        }
        tracing::debug!(actor = %self.profile.name, "session processing started");
        self.accumulator.reset();
        self.state = SessionState::Processing;
        self.continue_story()
    }

    /// Commit the choice at `index` and continue the story.
    pub fn select_choice(&mut self, index: usize) -> Result<(), SessionError> {
        match self.state {
            SessionState::Disposed => return Err(SessionError::Disposed),
            SessionState::AwaitingChoice => {}
            other => return Err(SessionError::NotAwaitingChoice(other)),
        }

        let choices = self.story.borrow().current_choices();
        let Some(choice) = choices.get(index) else {
            tracing::error!(index, count = choices.len(), "invalid choice index");
            return Err(SessionError::ChoiceOutOfRange {
                index,
                count: choices.len(),
            });
        };

        let text = strip_player_prefix(&choice.text).trim().to_string();
        self.flush(true);
        let committed = self.story.borrow_mut().choose_choice(index);
        if let Err(err) = committed {
            return Err(self.abort(err));
        }

        self.actor.borrow_mut().transcript.record_block(
            Speaker::Player,
            &self.titles.player,
            &text,
        );
        tracing::debug!(actor = %self.profile.name, index, choice = %text, "choice selected");
        self.observers
            .emit(&SessionEvent::ChoiceMade { index, text });

        self.accumulator.set_speaker(Some(Speaker::Player));
        self.state = SessionState::Processing;
        self.continue_story()
    }

    /// Tear the session down. Safe to call repeatedly, from any state.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        tracing::debug!(actor = %self.profile.name, "session disposed");
        self.state = SessionState::Disposed;
        self.observers.clear();
        self.accumulator.reset();
    }

    fn continue_story(&mut self) -> Result<(), SessionError> {
        self.process_linear_content()?;
        if self.state != SessionState::Processing {
            return Ok(());
        }
        self.process_choices();
        Ok(())
    }

    fn process_linear_content(&mut self) -> Result<(), SessionError> {
        while self.state == SessionState::Processing {
            let next = {
                let mut story = self.story.borrow_mut();
                if story.can_continue() {
                    Some(story.continue_line())
                } else {
                    None
                }
            };
            let line = match next {
                None => break,
                Some(Ok(line)) => line,
                Some(Err(err)) => return Err(self.abort(err)),
            };

            match classify(&line) {
                LineKind::Command(body) => {
                    self.flush(true);
                    self.dispatch(Command::parse(body));
                }
                LineKind::Dialogue { speaker, content } => {
                    if let Some(block) = self.accumulator.append(speaker, content) {
                        self.deliver(block);
                    }
                }
            }
        }
        if self.state == SessionState::Processing {
            self.flush(true);
        }
        Ok(())
    }

    fn process_choices(&mut self) {
        let choices = self.story.borrow().current_choices();
        if choices.is_empty() {
            self.complete_thread();
            return;
        }
        let views = choices
            .into_iter()
            .enumerate()
            .map(|(index, choice)| ChoiceView {
                index,
                text: strip_player_prefix(&choice.text).trim().to_string(),
                raw: choice.text,
            })
            .collect();
        self.state = SessionState::AwaitingChoice;
        self.observers.emit(&SessionEvent::ChoicesAvailable(views));
    }

    fn dispatch(&mut self, command: Command) {
        tracing::debug!(actor = %self.profile.name, ?command, "command received");
        match command {
            Command::Close => {
                self.actor
                    .borrow_mut()
                    .transcript
                    .append_marker(&self.closed_marker);
                self.force_close();
            }
            Command::Unknown(body) => {
                tracing::warn!(actor = %self.profile.name, command = %body, "unknown command ignored");
            }
        }
    }

    fn force_close(&mut self) {
        self.flush(true);
        tracing::info!(actor = %self.profile.name, "dialogue closed by command");
        self.state = SessionState::ForceClosed;
        self.observers.emit(&SessionEvent::CloseRequested);
        self.accumulator.reset_speakers();
    }

    fn complete_thread(&mut self) {
        tracing::info!(actor = %self.profile.name, "story thread complete");
        self.actor
            .borrow_mut()
            .transcript
            .append_marker(&self.ended_marker);
        self.state = SessionState::Completed;
        self.observers.emit(&SessionEvent::StoryComplete);

        if self.profile.start_option == StartOption::ContinueAndLoop {
            let mut story = self.story.borrow_mut();
            let flow = story.current_flow_name().to_string();
            if story.is_default_flow(&flow) {
                // Looping the default flow is undefined; leave it alone.
                tracing::warn!(
                    actor = %self.profile.name,
                    "ContinueAndLoop on the default flow, flow not removed"
                );
            } else if let Err(err) = story.remove_flow(&flow) {
                tracing::error!(flow = %flow, error = %err, "failed to remove flow for looping");
            } else {
                tracing::debug!(flow = %flow, "flow removed for looping");
            }
        }
        self.accumulator.reset_speakers();
    }

    fn flush(&mut self, force: bool) {
        if let Some(block) = self.accumulator.flush(force) {
            self.deliver(block);
        }
    }

    /// Record a finished block in the transcript and hand it to observers.
    fn deliver(&mut self, block: Block) {
        let title = self.titles.for_speaker(block.speaker);
        self.actor
            .borrow_mut()
            .transcript
            .record_block(block.speaker, title, &block.text);
        tracing::trace!(speaker = ?block.speaker, text = %block.text, "block delivered");
        let event = SessionEvent::ContentAvailable(ContentBlock {
            speaker: block.speaker,
            title: block.show_title.then(|| title.to_string()),
            text: block.text,
        });
        self.observers.emit(&event);
    }

    fn abort(&mut self, err: StoryError) -> SessionError {
        tracing::error!(actor = %self.profile.name, error = %err, "story failed, session aborted");
        self.state = SessionState::Aborted;
        self.accumulator.reset();
        SessionError::Story(err)
    }
}
