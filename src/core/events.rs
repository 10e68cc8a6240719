//! Session events and observer registration.

use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::schema::speaker::Speaker;

/// A block of content ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub speaker: Speaker,
    pub title: Option<String>,
    pub text: String,
}

impl ContentBlock {
    pub fn includes_title(&self) -> bool {
        self.title.is_some()
    }

    /// `title\ntext`, or just `text` when the title is suppressed.
    pub fn formatted(&self) -> String {
        match &self.title {
            Some(title) => format!("{}\n{}", title, self.text),
            None => self.text.clone(),
        }
    }
}

/// A choice as offered to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub index: usize,
    /// Display text with the player marker stripped and trimmed.
    pub text: String,
    /// Text exactly as the script wrote it.
    pub raw: String,
}

/// Everything a session reports to its observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    ContentAvailable(ContentBlock),
    ChoicesAvailable(Vec<ChoiceView>),
    ChoiceMade { index: usize, text: String },
    StoryComplete,
    CloseRequested,
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&SessionEvent)>;

/// Ordered list of event callbacks.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sub, _)| *sub != id);
        self.callbacks.len() != before
    }

    pub fn emit(&mut self, event: &SessionEvent) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(event);
        }
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

/// A shared FIFO of events, for consumers that poll instead of reacting.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<SessionEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that pushes every event into this queue.
    pub fn sink(&self) -> impl FnMut(&SessionEvent) + 'static {
        let events = Rc::clone(&self.events);
        move |event| events.borrow_mut().push_back(event.clone())
    }

    pub fn pop(&self) -> Option<SessionEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn drain(&self) -> Vec<SessionEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_block() {
        let titled = ContentBlock {
            speaker: Speaker::Npc,
            title: Some("=== Mira ===".to_string()),
            text: "Hello".to_string(),
        };
        assert_eq!(titled.formatted(), "=== Mira ===\nHello");
        let plain = ContentBlock {
            title: None,
            ..titled
        };
        assert!(!plain.includes_title());
        assert_eq!(plain.formatted(), "Hello");
    }

    #[test]
    fn subscribe_emit_unsubscribe() {
        let mut observers = Observers::new();
        let queue = EventQueue::new();
        let id = observers.subscribe(queue.sink());
        observers.emit(&SessionEvent::StoryComplete);
        assert_eq!(queue.len(), 1);

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.emit(&SessionEvent::CloseRequested);
        assert_eq!(queue.drain(), vec![SessionEvent::StoryComplete]);
    }

    #[test]
    fn clear_detaches_all() {
        let mut observers = Observers::new();
        let queue = EventQueue::new();
        observers.subscribe(queue.sink());
        observers.subscribe(queue.sink());
        assert_eq!(observers.len(), 2);
        observers.clear();
        assert!(observers.is_empty());
        observers.emit(&SessionEvent::StoryComplete);
        assert!(queue.is_empty());
    }
}
