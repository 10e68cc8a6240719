//! Data types shared by the dialogue runtime.

pub mod actor;
pub mod config;
pub mod speaker;
pub mod transcript;
pub mod value;
