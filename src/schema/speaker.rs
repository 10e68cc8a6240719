//! Speaker attribution for dialogue blocks and transcript entries.

use serde::{Deserialize, Serialize};

/// Who owns a block of dialogue content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// The NPC side of the conversation.
    Npc,
    /// The player character.
    Player,
}

impl Speaker {
    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }
}
