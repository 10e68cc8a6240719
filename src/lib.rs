//! Dialogue Flow: an engine-agnostic runtime for branching NPC dialogue.
//!
//! Drives a narrative script line by line, groups the lines into
//! speaker-attributed blocks, presents choices, dispatches inline commands
//! and keeps a per-actor transcript, independent of any rendering layer.

pub mod core;
pub mod schema;
