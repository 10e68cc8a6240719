/// Tavern Keeper example: a scripted evening at the Gilded Tankard.
///
/// The traveller chats with Mira, buys an ale, asks about rumours and says
/// goodbye, then hears half of Old Tom's story twice over.
///
/// Run with: cargo run --example tavern_keeper

use dialogue_flow::core::controller::DialogueController;
use dialogue_flow::core::events::{EventQueue, SessionEvent};
use dialogue_flow::core::host::{SharedHost, StoryHost};
use dialogue_flow::core::library::StoryLibrary;
use dialogue_flow::core::panel::PanelAction;
use dialogue_flow::schema::actor::{Actor, ActorHandle};
use dialogue_flow::schema::config::DialogueConfig;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug)]
struct Purse {
    coins: i64,
    quests: Vec<(String, String)>,
}

impl StoryHost for Purse {
    fn currency(&self, _holder: &str) -> i64 {
        self.coins
    }

    fn remove_currency(&mut self, _holder: &str, amount: i64) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        true
    }

    fn add_item(&mut self, _holder: &str, item: &str, quantity: i64) -> bool {
        println!("    (received {} x {})", quantity, item);
        true
    }

    fn quest_status(&self, quest: &str) -> String {
        self.quests
            .iter()
            .rev()
            .find(|(q, _)| q == quest)
            .map(|(_, status)| status.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn set_quest_status(&mut self, quest: &str, status: &str) -> bool {
        println!("    (quest '{}' is now {})", quest, status);
        self.quests.push((quest.to_string(), status.to_string()));
        true
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = Path::new("story_data/tavern/dialogue.ron");
    let config = DialogueConfig::load_from_ron(config_path).expect("Failed to load tavern config");

    let purse = Rc::new(RefCell::new(Purse {
        coins: 4,
        quests: Vec::new(),
    }));
    let host: SharedHost = purse.clone();
    let library = StoryLibrary::from_config(&config, Path::new("story_data/tavern"), host);

    let mira = Actor::new(config.actor("Mira").cloned().expect("Mira is in the cast")).into_handle();
    let tom = Actor::new(config.actor("Old Tom").cloned().expect("Old Tom is in the cast")).into_handle();

    let mut controller = DialogueController::new(library, config);

    println!("=== The Gilded Tankard ===\n");

    // --- Mira: ale, rumours, goodbye ---
    converse(&mut controller, &mira, &[0, 1, 2]);

    // --- Old Tom: wanders off mid-story, then starts over ---
    converse(&mut controller, &tom, &[1]);
    converse(&mut controller, &tom, &[0]);

    println!("=== Mira's transcript ===\n");
    for entry in mira.borrow().transcript.entries() {
        println!("{}\n", entry.render());
    }
    println!("Coins left: {}", purse.borrow().coins);
}

/// Run one conversation, answering choices from `picks` in order.
fn converse(controller: &mut DialogueController, actor: &ActorHandle, picks: &[usize]) {
    println!("--- Talking to {} ---\n", actor.borrow().profile.name);
    controller
        .start_dialogue(actor)
        .expect("Failed to start dialogue");
    let mut panel = controller.open_panel().expect("Dialogue is active");
    let events = EventQueue::new();
    controller
        .subscribe(events.sink())
        .expect("Dialogue is active");
    controller.ui_ready().expect("Dialogue failed");

    let mut picks = picks.iter().copied();
    loop {
        let mut offered = Vec::new();
        let mut closing = false;
        while let Some(event) = events.pop() {
            match &event {
                SessionEvent::ContentAvailable(block) => println!("{}\n", block.formatted()),
                SessionEvent::ChoicesAvailable(choices) => {
                    for choice in choices {
                        println!("  [{}] {}", choice.index + 1, choice.text);
                    }
                    println!();
                    offered = choices.clone();
                }
                SessionEvent::StoryComplete => println!("    (the conversation winds down)\n"),
                _ => {}
            }
            if panel.apply(&event) == PanelAction::Close {
                closing = true;
            }
        }

        if closing || offered.is_empty() {
            break;
        }
        let Some(index) = picks.next().and_then(|pick| panel.pick(pick)) else {
            break;
        };
        println!("> {}\n", offered[index].text);
        controller.select_choice(index).expect("Dialogue failed");
    }

    controller.close();
}
