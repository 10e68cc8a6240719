//! WASM bindings for dialogue-flow: powers the interactive tavern demo.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use dialogue_flow::core::controller::DialogueController;
use dialogue_flow::core::events::{EventQueue, SessionEvent};
use dialogue_flow::core::host::{SharedHost, StoryHost};
use dialogue_flow::core::library::{StoryLibrary, StorySource};
use dialogue_flow::core::runtime::DiagnosticPolicy;
use dialogue_flow::schema::actor::{Actor, ActorHandle};
use dialogue_flow::schema::config::DialogueConfig;

// ---------------------------------------------------------------------------
// Embedded story data: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const TAVERN_SCRIPT: &str = include_str!("../../story_data/tavern/tavern.ron");
    pub const TAVERN_CONFIG: &str = include_str!("../../story_data/tavern/dialogue.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct TranscriptLine {
    title: Option<String>,
    text: String,
}

#[derive(serde::Serialize)]
struct StepResult {
    events: Vec<SessionEvent>,
    active: bool,
    coins: i64,
}

/// The player's side of the game, as far as the tavern script cares.
#[derive(Debug, Default)]
struct Wallet {
    coins: i64,
    items: BTreeMap<String, i64>,
    quests: BTreeMap<String, String>,
}

impl StoryHost for Wallet {
    fn count_item(&self, _holder: &str, item: &str) -> i64 {
        self.items.get(item).copied().unwrap_or(0)
    }

    fn add_item(&mut self, _holder: &str, item: &str, quantity: i64) -> bool {
        *self.items.entry(item.to_string()).or_insert(0) += quantity;
        true
    }

    fn currency(&self, _holder: &str) -> i64 {
        self.coins
    }

    fn add_currency(&mut self, _holder: &str, amount: i64) {
        self.coins += amount;
    }

    fn remove_currency(&mut self, _holder: &str, amount: i64) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        true
    }

    fn quest_status(&self, quest: &str) -> String {
        self.quests
            .get(quest)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn set_quest_status(&mut self, quest: &str, status: &str) -> bool {
        self.quests.insert(quest.to_string(), status.to_string());
        true
    }
}

// ---------------------------------------------------------------------------
// DialogueDemo: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct DialogueDemo {
    controller: DialogueController,
    cast: BTreeMap<String, ActorHandle>,
    wallet: Rc<RefCell<Wallet>>,
    events: EventQueue,
}

#[wasm_bindgen]
impl DialogueDemo {
    /// Create the tavern demo with the player holding `coins`.
    #[wasm_bindgen(constructor)]
    pub fn new(coins: i64) -> Result<DialogueDemo, JsError> {
        let config = DialogueConfig::parse_ron(data::TAVERN_CONFIG)
            .map_err(|e| JsError::new(&format!("Config parse error: {e}")))?;

        let wallet = Rc::new(RefCell::new(Wallet {
            coins,
            ..Wallet::default()
        }));
        let host: SharedHost = wallet.clone();
        let mut library = StoryLibrary::new(host).with_policy(DiagnosticPolicy {
            log_warnings: config.log_story_warnings,
            log_errors: config.log_story_errors,
        });
        library.register("default", StorySource::Text(data::TAVERN_SCRIPT.to_string()));

        let cast = config
            .actors
            .iter()
            .map(|profile| (profile.name.clone(), Actor::new(profile.clone()).into_handle()))
            .collect();

        Ok(DialogueDemo {
            controller: DialogueController::new(library, config),
            cast,
            wallet,
            events: EventQueue::new(),
        })
    }

    /// Start talking to `name`. Returns the resulting events as JSON.
    pub fn talk(&mut self, name: &str) -> Result<String, JsError> {
        let actor = self
            .cast
            .get(name)
            .ok_or_else(|| JsError::new(&format!("Unknown actor: {name}")))?;
        self.controller.close();
        self.controller
            .start_dialogue(actor)
            .map_err(|e| JsError::new(&format!("Dialogue failed to start: {e}")))?;
        self.events = EventQueue::new();
        self.controller
            .subscribe(self.events.sink())
            .map_err(|e| JsError::new(&format!("Dialogue failed to start: {e}")))?;
        self.controller
            .ui_ready()
            .map_err(|e| JsError::new(&format!("Dialogue error: {e}")))?;
        self.step_result()
    }

    /// Pick a choice by index. Returns the resulting events as JSON.
    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        self.controller
            .select_choice(index)
            .map_err(|e| JsError::new(&format!("Dialogue error: {e}")))?;
        self.step_result()
    }

    pub fn close(&mut self) {
        self.controller.close();
    }

    /// An actor's transcript as a JSON array of `{title, text}`.
    pub fn transcript(&self, name: &str) -> Result<String, JsError> {
        let actor = self
            .cast
            .get(name)
            .ok_or_else(|| JsError::new(&format!("Unknown actor: {name}")))?;
        let lines: Vec<TranscriptLine> = actor
            .borrow()
            .transcript
            .entries()
            .iter()
            .map(|entry| TranscriptLine {
                title: entry.title.clone(),
                text: entry.text.clone(),
            })
            .collect();
        serde_json::to_string(&lines).map_err(|e| JsError::new(&format!("JSON error: {e}")))
    }

    /// Names of everyone in the tavern, as a JSON array.
    pub fn actors(&self) -> String {
        serde_json::to_string(&self.cast.keys().collect::<Vec<_>>()).unwrap_or_default()
    }

    pub fn save_state(&mut self) -> Result<String, JsError> {
        self.controller
            .library_mut()
            .save_state("")
            .map_err(|e| JsError::new(&format!("Save error: {e}")))
    }

    pub fn load_state(&mut self, snapshot: &str) -> Result<(), JsError> {
        self.controller.close();
        self.controller
            .library_mut()
            .load_state("", snapshot)
            .map_err(|e| JsError::new(&format!("Load error: {e}")))
    }
}

impl DialogueDemo {
    fn step_result(&mut self) -> Result<String, JsError> {
        let events = self.events.drain();
        if events.contains(&SessionEvent::CloseRequested) {
            self.controller.close();
        }
        let result = StepResult {
            events,
            active: self.controller.is_active(),
            coins: self.wallet.borrow().coins,
        };
        serde_json::to_string(&result).map_err(|e| JsError::new(&format!("JSON error: {e}")))
    }
}
