//! Whole-game scenarios.
//!
//! Each test drives a [`GameSession`](crate::session::GameSession) through
//! player commands only, with a scripted model endpoint answering every
//! agent and an in-memory store receiving the saves.

mod combat_flow_tests;
mod e2e_helpers;

pub use e2e_helpers::*;
