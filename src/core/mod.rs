//! Runtime machinery: line classification, block accumulation, the session
//! state machine and the collaborators around it.

pub mod accumulator;
pub mod classifier;
pub mod controller;
pub mod events;
pub mod flow;
pub mod host;
pub mod library;
pub mod log;
pub mod panel;
pub mod runtime;
pub mod script;
pub mod session;
