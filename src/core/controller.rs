//! Dialogue controller: runs one conversation at a time
//! on top of a [`StoryLibrary`].

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::core::events::{SessionEvent, SubscriptionId};
use crate::core::host::DialogueContext;
use crate::core::library::{LibraryError, StoryHandle, StoryLibrary};
use crate::core::log::DialogueLog;
use crate::core::panel::DialoguePanel;
use crate::core::runtime::SharedStory;
use crate::core::session::{DialogueSession, SessionError};
use crate::schema::actor::ActorHandle;
use crate::schema::config::DialogueConfig;
use crate::schema::value::Value;

/// Script variable set to the actor's id when a conversation starts.
pub const NPC_ID_VARIABLE: &str = "npc_id";

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("a dialogue is already in progress")]
    AlreadyInProgress,
    #[error("no active dialogue")]
    NoActiveDialogue,
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug)]
struct ActiveDialogue {
    session: DialogueSession,
    story: StoryHandle,
    story_key: String,
}

#[derive(Debug)]
pub struct DialogueController {
    library: StoryLibrary,
    config: DialogueConfig,
    active: Option<ActiveDialogue>,
    setup_in_progress: bool,
    log: Rc<RefCell<DialogueLog>>,
}

impl DialogueController {
    pub fn new(library: StoryLibrary, config: DialogueConfig) -> Self {
        let log = DialogueLog::new(config.player_name.clone()).with_echo(config.log_dialogue);
        Self {
            library,
            config,
            active: None,
            setup_in_progress: false,
            log: Rc::new(RefCell::new(log)),
        }
    }

    /// Prepare the actor's story and create a session for it.
    ///
    /// The session is not started; call [`Self::ui_ready`] once the
    /// presentation layer is subscribed.
    pub fn start_dialogue(&mut self, actor: &ActorHandle) -> Result<(), DialogueError> {
        if self.active.is_some() || self.setup_in_progress {
            tracing::warn!("dialogue requested while another is in progress");
            return Err(DialogueError::AlreadyInProgress);
        }
        self.setup_in_progress = true;
        let result = self.setup(actor);
        self.setup_in_progress = false;
        result
    }

    fn setup(&mut self, actor: &ActorHandle) -> Result<(), DialogueError> {
        let profile = actor.borrow().profile.clone();
        tracing::info!(actor = %profile.name, story = profile.story_key(), "starting dialogue");

        // The context must be in place before the entry knot starts running.
        let story = self.library.story(profile.story_key())?;
        story.borrow_mut().set_context(Some(DialogueContext {
            npc_name: profile.name.clone(),
            npc_id: profile.id.clone(),
        }));
        // npc_id goes in after any reset and before the entry path runs.
        let prepared = self
            .library
            .prepare_for_dialogue_with(&profile, |story| match &profile.id {
                Some(id) => {
                    if let Err(err) = story.set_variable(NPC_ID_VARIABLE, Value::from(id.as_str())) {
                        tracing::error!(actor = %profile.name, error = %err, "failed to set npc_id");
                    }
                }
                None => tracing::warn!(actor = %profile.name, "actor has no id, npc_id not set"),
            });
        if let Err(err) = prepared {
            story.borrow_mut().set_context(None);
            return Err(err.into());
        }

        let shared: SharedStory = story.clone();
        let mut session = DialogueSession::new(shared, Rc::clone(actor), &self.config);
        self.log.borrow_mut().start_session();
        let log = Rc::clone(&self.log);
        session.subscribe(move |event| log.borrow_mut().record(event));

        self.active = Some(ActiveDialogue {
            session,
            story,
            story_key: profile.story_key().to_string(),
        });
        Ok(())
    }

    /// Subscribe to the active session's events.
    pub fn subscribe<F>(&mut self, callback: F) -> Result<SubscriptionId, DialogueError>
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        let active = self.active.as_mut().ok_or(DialogueError::NoActiveDialogue)?;
        Ok(active.session.subscribe(callback))
    }

    /// A panel for the active dialogue, showing history per the actor's
    /// append setting.
    pub fn open_panel(&self) -> Result<DialoguePanel, DialogueError> {
        let active = self.active.as_ref().ok_or(DialogueError::NoActiveDialogue)?;
        let actor = active.session.actor().borrow();
        Ok(DialoguePanel::open(
            &actor.transcript,
            actor.profile.append_dialogue,
            self.config.max_history_entries,
        ))
    }

    /// The presentation layer is ready: start processing.
    pub fn ui_ready(&mut self) -> Result<(), DialogueError> {
        let active = self.active.as_mut().ok_or(DialogueError::NoActiveDialogue)?;
        let result = active.session.begin_processing();
        self.finish_step(result)
    }

    pub fn select_choice(&mut self, index: usize) -> Result<(), DialogueError> {
        let active = self.active.as_mut().ok_or(DialogueError::NoActiveDialogue)?;
        let result = active.session.select_choice(index);
        self.finish_step(result)
    }

    /// End the active dialogue, if any. Safe to call repeatedly.
    pub fn close(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        tracing::info!(actor = %active.session.profile().name, "closing dialogue");
        active.session.dispose();
        active.story.borrow_mut().set_context(None);
        self.library.report_diagnostics(&active.story_key);
        self.log.borrow_mut().finish_session();
    }

    fn finish_step(&mut self, result: Result<(), SessionError>) -> Result<(), DialogueError> {
        if let Some(active) = &self.active {
            self.library.report_diagnostics(&active.story_key);
        }
        match result {
            Ok(()) => Ok(()),
            Err(err @ SessionError::Story(_)) => {
                tracing::error!(error = %err, "dialogue aborted");
                self.close();
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&DialogueSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn session_mut(&mut self) -> Option<&mut DialogueSession> {
        self.active.as_mut().map(|a| &mut a.session)
    }

    pub fn library(&self) -> &StoryLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut StoryLibrary {
        &mut self.library
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    pub fn log(&self) -> &Rc<RefCell<DialogueLog>> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::StorySource;
    use crate::core::session::SessionState;
    use crate::schema::actor::{Actor, ActorProfile, StartOption};

    const SCRIPT: &str = r#"(
        variables: { "npc_id": String(""), "who": String("") },
        knots: {
            "mira_start": [
                Call(NpcName, Some("who")),
                Line("I'm {who}."),
                Choices([(text: "p: Bye")]),
            ],
        },
    )"#;

    fn controller() -> DialogueController {
        let mut library = StoryLibrary::default();
        library.register("default", StorySource::Text(SCRIPT.to_string()));
        DialogueController::new(library, DialogueConfig::default())
    }

    #[test]
    fn one_dialogue_at_a_time() {
        let mut ctl = controller();
        let mira = Actor::new(ActorProfile::new("Mira").with_id("mira-01")).into_handle();
        ctl.start_dialogue(&mira).unwrap();
        assert!(matches!(
            ctl.start_dialogue(&mira),
            Err(DialogueError::AlreadyInProgress)
        ));
        ctl.close();
        ctl.close();
        assert!(!ctl.is_active());
        ctl.start_dialogue(&mira).unwrap();
    }

    #[test]
    fn start_sets_id_and_context() {
        let mut ctl = controller();
        let mira = Actor::new(ActorProfile::new("Mira").with_id("mira-01")).into_handle();
        ctl.start_dialogue(&mira).unwrap();
        assert_eq!(ctl.session().map(|s| s.state()), Some(SessionState::Idle));
        ctl.ui_ready().unwrap();
        assert_eq!(
            ctl.library_mut().variable("", NPC_ID_VARIABLE).unwrap(),
            Some(Value::from("mira-01"))
        );
        assert_eq!(
            mira.borrow().transcript.entries()[0].text,
            "I'm Mira."
        );

        let story = ctl.library_mut().story("").unwrap();
        assert!(story.borrow().context().is_some());
        ctl.close();
        assert!(story.borrow().context().is_none());
    }

    #[test]
    fn entry_path_sees_npc_id() {
        let mut library = StoryLibrary::default();
        library.register(
            "default",
            StorySource::Text(
                r#"(
                    variables: { "npc_id": String("") },
                    knots: {
                        "mira_start": [
                            When("npc_id", String("mira-01"), "known"),
                            Line("Who are you again?"),
                        ],
                        "known": [Line("I know who I am.")],
                    },
                )"#
                .to_string(),
            ),
        );
        let mut ctl = DialogueController::new(library, DialogueConfig::default());
        let mira = Actor::new(
            ActorProfile::new("Mira")
                .with_id("mira-01")
                .with_start_option(StartOption::AlwaysResetStory),
        )
        .into_handle();

        for _ in 0..2 {
            ctl.start_dialogue(&mira).unwrap();
            ctl.ui_ready().unwrap();
            ctl.close();
        }
        let texts: Vec<String> = mira
            .borrow()
            .transcript
            .entries()
            .iter()
            .map(|e| e.text.clone())
            .collect();
        assert_eq!(texts[0], "I know who I am.");
        assert!(!texts.iter().any(|t| t == "Who are you again?"));
    }

    #[test]
    fn calls_without_dialogue_fail() {
        let mut ctl = controller();
        assert!(matches!(ctl.ui_ready(), Err(DialogueError::NoActiveDialogue)));
        assert!(matches!(ctl.select_choice(0), Err(DialogueError::NoActiveDialogue)));
        assert!(ctl.open_panel().is_err());
    }

    #[test]
    fn failed_preparation_leaves_no_session() {
        let mut ctl = controller();
        let bram = Actor::new(ActorProfile::new("Bram")).into_handle();
        assert!(matches!(
            ctl.start_dialogue(&bram),
            Err(DialogueError::Library(LibraryError::Preparation { .. }))
        ));
        assert!(!ctl.is_active());
    }

    #[test]
    fn dialogue_echo_follows_config() {
        assert!(controller().log().borrow().is_echoing());

        let config = DialogueConfig {
            log_dialogue: false,
            ..DialogueConfig::default()
        };
        let quiet = DialogueController::new(StoryLibrary::default(), config);
        assert!(!quiet.log().borrow().is_echoing());
    }

    #[test]
    fn log_follows_the_session() {
        let mut ctl = controller();
        let mira = Actor::new(ActorProfile::new("Mira")).into_handle();
        ctl.start_dialogue(&mira).unwrap();
        ctl.ui_ready().unwrap();
        ctl.select_choice(0).unwrap();
        let lines = ctl.log().borrow().lines().to_vec();
        assert_eq!(lines, vec!["=== Mira ===\nI'm Mira.", "Player chooses: Bye"]);
    }
}
