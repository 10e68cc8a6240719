/// Dialogue Preview: interactive shell for playing through dialogue scripts.
///
/// Usage: dialogue_preview --config <dialogue.ron> [--coins <n>]
///        dialogue_preview --script <script.ron> --actor <name> [--id <id>]
///                         [--start <path>] [--option <start_option>]
///
/// Commands:
///   talk [name]  start a conversation (default: first actor)
///   <n>  pick choice n
///   close  end the current conversation
///   history [name]  print an actor's transcript
///   actors  list actors
///   var <name>  show a story variable
///   save <file>  write the story state to a file
///   load <file>  restore the story state from a file
///   help  list commands
///   quit  exit

use dialogue_flow::core::controller::DialogueController;
use dialogue_flow::core::events::{EventQueue, SessionEvent};
use dialogue_flow::core::host::{SharedHost, StoryHost};
use dialogue_flow::core::library::{StoryLibrary, StorySource};
use dialogue_flow::core::panel::{DialoguePanel, PanelAction};
use dialogue_flow::schema::actor::{Actor, ActorHandle, ActorProfile, StartOption, DEFAULT_STORY_KEY};
use dialogue_flow::schema::config::DialogueConfig;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Stand-in for the game: a purse, a bag and a quest log.
#[derive(Debug, Default)]
struct PreviewHost {
    coins: i64,
    items: FxHashMap<String, i64>,
    quests: FxHashMap<String, String>,
}

impl StoryHost for PreviewHost {
    fn count_item(&self, _holder: &str, item: &str) -> i64 {
        self.items.get(item).copied().unwrap_or(0)
    }

    fn can_add_item(&self, _holder: &str, _item: &str, _quantity: i64) -> bool {
        true
    }

    fn add_item(&mut self, _holder: &str, item: &str, quantity: i64) -> bool {
        *self.items.entry(item.to_string()).or_insert(0) += quantity;
        println!("  [+{} {}]", quantity, item);
        true
    }

    fn remove_item(&mut self, _holder: &str, item: &str, quantity: i64) -> bool {
        match self.items.get_mut(item) {
            Some(count) if *count >= quantity => {
                *count -= quantity;
                println!("  [-{} {}]", quantity, item);
                true
            }
            _ => false,
        }
    }

    fn currency(&self, _holder: &str) -> i64 {
        self.coins
    }

    fn add_currency(&mut self, _holder: &str, amount: i64) {
        self.coins += amount;
        println!("  [+{} coins]", amount);
    }

    fn remove_currency(&mut self, _holder: &str, amount: i64) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        println!("  [-{} coins]", amount);
        true
    }

    fn quest_status(&self, quest: &str) -> String {
        self.quests
            .get(quest)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn set_quest_status(&mut self, quest: &str, status: &str) -> bool {
        println!("  [quest {}: {}]", quest, status);
        self.quests.insert(quest.to_string(), status.to_string());
        true
    }
}

struct Options {
    config_path: Option<PathBuf>,
    script_path: Option<PathBuf>,
    actor: Option<String>,
    id: Option<String>,
    start: Option<String>,
    option: StartOption,
    coins: i64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut opts = Options {
        config_path: None,
        script_path: None,
        actor: None,
        id: None,
        start: None,
        option: StartOption::Continue,
        coins: 10,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                opts.config_path = Some(PathBuf::from(&args[i]));
            }
            "--script" if i + 1 < args.len() => {
                i += 1;
                opts.script_path = Some(PathBuf::from(&args[i]));
            }
            "--actor" if i + 1 < args.len() => {
                i += 1;
                opts.actor = Some(args[i].clone());
            }
            "--id" if i + 1 < args.len() => {
                i += 1;
                opts.id = Some(args[i].clone());
            }
            "--start" if i + 1 < args.len() => {
                i += 1;
                opts.start = Some(args[i].clone());
            }
            "--option" if i + 1 < args.len() => {
                i += 1;
                opts.option = match parse_start_option(&args[i]) {
                    Some(option) => option,
                    None => {
                        eprintln!("Unknown start option: {}", args[i]);
                        std::process::exit(1);
                    }
                };
            }
            "--coins" if i + 1 < args.len() => {
                i += 1;
                opts.coins = args[i].parse().unwrap_or(10);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let host = Rc::new(RefCell::new(PreviewHost {
        coins: opts.coins,
        ..PreviewHost::default()
    }));
    let (mut controller, actors) = match build(&opts, host.clone()) {
        Ok(built) => built,
        Err(message) => {
            eprintln!("ERROR: {}", message);
            std::process::exit(1);
        }
    };

    println!("Loaded {} actor(s): {}", actors.len(), actor_names(&actors).join(", "));
    // var/save/load act on the story of the last actor talked to.
    let mut story_key = story_key_for(&actors, None);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut panel: Option<DialoguePanel> = None;
    let mut events = EventQueue::new();

    loop {
        print!("dialogue> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        if let Ok(number) = cmd.parse::<usize>() {
            let Some(active_panel) = panel.as_mut() else {
                println!("No conversation in progress. Try 'talk'.");
                continue;
            };
            let Some(index) = number.checked_sub(1).and_then(|n| active_panel.pick(n)) else {
                println!("No choice {}.", number);
                continue;
            };
            if let Err(e) = controller.select_choice(index) {
                println!("Dialogue failed: {}", e);
                panel = None;
                continue;
            }
            pump(&mut controller, &events, &mut panel);
            continue;
        }

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                controller.close();
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "actors" => {
                for name in actor_names(&actors) {
                    println!("  {}", name);
                }
            }
            "talk" => {
                let name = if parts.len() > 1 {
                    parts[1..].join(" ")
                } else {
                    actor_names(&actors).first().cloned().unwrap_or_default()
                };
                let Some(actor) = actors.get(&name) else {
                    println!("No actor named '{}'.", name);
                    continue;
                };
                if controller.is_active() {
                    controller.close();
                }
                story_key = story_key_for(&actors, Some(name.as_str()));
                if let Err(e) = controller.start_dialogue(actor) {
                    println!("Dialogue failed to start: {}", e);
                    continue;
                }
                let opened = match controller.open_panel() {
                    Ok(opened) => opened,
                    Err(e) => {
                        println!("Dialogue failed to start: {}", e);
                        continue;
                    }
                };
                if !opened.text().is_empty() {
                    println!("{}\n", opened.text());
                }
                panel = Some(opened);
                events = EventQueue::new();
                if let Err(e) = controller.subscribe(events.sink()) {
                    println!("Dialogue failed to start: {}", e);
                    continue;
                }
                if let Err(e) = controller.ui_ready() {
                    println!("Dialogue failed: {}", e);
                    panel = None;
                    continue;
                }
                pump(&mut controller, &events, &mut panel);
            }
            "close" => {
                controller.close();
                panel = None;
                println!("(conversation closed)");
            }
            "history" => {
                let name = if parts.len() > 1 {
                    parts[1..].join(" ")
                } else {
                    actor_names(&actors).first().cloned().unwrap_or_default()
                };
                match actors.get(&name) {
                    Some(actor) => {
                        let actor = actor.borrow();
                        if actor.transcript.is_empty() {
                            println!("(no history with {})", name);
                        }
                        for entry in actor.transcript.entries() {
                            println!("{}\n", entry.render());
                        }
                    }
                    None => println!("No actor named '{}'.", name),
                }
            }
            "var" => {
                if parts.len() < 2 {
                    println!("Usage: var <name>");
                    continue;
                }
                match controller.library_mut().variable(&story_key, parts[1]) {
                    Ok(Some(value)) => println!("{} = {}", parts[1], value),
                    Ok(None) => println!("{} is not declared", parts[1]),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "save" => {
                if parts.len() < 2 {
                    println!("Usage: save <file>");
                    continue;
                }
                match controller.library_mut().save_state(&story_key) {
                    Ok(snapshot) => match std::fs::write(parts[1], snapshot) {
                        Ok(()) => println!("Saved story state to {}", parts[1]),
                        Err(e) => println!("Error writing {}: {}", parts[1], e),
                    },
                    Err(e) => println!("Error: {}", e),
                }
            }
            "load" => {
                if parts.len() < 2 {
                    println!("Usage: load <file>");
                    continue;
                }
                if controller.is_active() {
                    println!("Close the conversation first.");
                    continue;
                }
                match std::fs::read_to_string(parts[1]) {
                    Ok(snapshot) => match controller.library_mut().load_state(&story_key, &snapshot) {
                        Ok(()) => println!("Loaded story state from {}", parts[1]),
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("Error reading {}: {}", parts[1], e),
                }
            }
            _ => println!("Unknown command '{}'. Type 'help'.", cmd),
        }
    }

    println!("Purse: {} coins", host.borrow().coins);
}

type Cast = FxHashMap<String, ActorHandle>;

fn build(opts: &Options, host: Rc<RefCell<PreviewHost>>) -> Result<(DialogueController, Cast), String> {
    let shared: SharedHost = host;
    let mut cast = Cast::default();

    if let Some(path) = &opts.config_path {
        let config = DialogueConfig::load_from_ron(path)
            .map_err(|e| format!("failed to load config {}: {}", path.display(), e))?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        let library = StoryLibrary::from_config(&config, base_dir, shared);
        for profile in &config.actors {
            cast.insert(profile.name.clone(), Actor::new(profile.clone()).into_handle());
        }
        return Ok((DialogueController::new(library, config), cast));
    }

    let Some(script) = &opts.script_path else {
        return Err("either --config or --script is required".to_string());
    };
    let Some(name) = &opts.actor else {
        return Err("--script needs --actor <name>".to_string());
    };
    let mut library = StoryLibrary::new(shared);
    library.register("default", StorySource::File(script.clone()));

    let mut profile = ActorProfile::new(name.clone()).with_start_option(opts.option);
    if let Some(id) = &opts.id {
        profile = profile.with_id(id.clone());
    }
    if let Some(start) = &opts.start {
        profile = profile.with_start_path(start.clone());
    }
    cast.insert(name.clone(), Actor::new(profile).into_handle());
    Ok((DialogueController::new(library, DialogueConfig::default()), cast))
}

/// Print pending events and keep the panel in step.
fn pump(controller: &mut DialogueController, events: &EventQueue, panel: &mut Option<DialoguePanel>) {
    while let Some(event) = events.pop() {
        match &event {
            SessionEvent::ContentAvailable(block) => println!("{}\n", block.formatted()),
            SessionEvent::ChoicesAvailable(choices) => {
                for choice in choices {
                    println!("  {}. {}", choice.index + 1, choice.text);
                }
            }
            SessionEvent::StoryComplete => println!("(the conversation is over; type 'close')"),
            SessionEvent::CloseRequested | SessionEvent::ChoiceMade { .. } => {}
        }
        let action = panel
            .as_mut()
            .map(|p| p.apply(&event))
            .unwrap_or(PanelAction::None);
        if action == PanelAction::Close {
            controller.close();
            *panel = None;
            println!("(conversation closed)");
        }
    }
}

/// Story key of the named actor, or of the first actor by name.
fn story_key_for(cast: &Cast, name: Option<&str>) -> String {
    let name = match name {
        Some(name) => Some(name.to_string()),
        None => actor_names(cast).into_iter().next(),
    };
    name.and_then(|n| cast.get(&n))
        .map(|actor| actor.borrow().profile.story_key().to_string())
        .unwrap_or_else(|| DEFAULT_STORY_KEY.to_string())
}

fn parse_start_option(s: &str) -> Option<StartOption> {
    match s.to_lowercase().replace(['-', '_'], "").as_str() {
        "continue" => Some(StartOption::Continue),
        "continueandloop" | "loop" => Some(StartOption::ContinueAndLoop),
        "alwaysfromstartpath" | "fromstart" => Some(StartOption::AlwaysFromStartPath),
        "alwaysresetstory" | "reset" => Some(StartOption::AlwaysResetStory),
        _ => None,
    }
}

fn actor_names(cast: &Cast) -> Vec<String> {
    let mut names: Vec<String> = cast.keys().cloned().collect();
    names.sort();
    names
}

fn print_usage() {
    println!("Usage: dialogue_preview --config <dialogue.ron> [--coins <n>]");
    println!("       dialogue_preview --script <script.ron> --actor <name> [--id <id>]");
    println!("                        [--start <path>] [--option <start_option>]");
}

fn print_help() {
    println!("Commands:");
    println!("  talk [name]     start a conversation");
    println!("  <n>             pick choice n");
    println!("  close           end the current conversation");
    println!("  history [name]  print an actor's transcript");
    println!("  actors          list actors");
    println!("  var <name>      show a story variable");
    println!("  save <file>     write the story state to a file");
    println!("  load <file>     restore the story state from a file");
    println!("  help            this list");
    println!("  quit            exit");
}
