//! Dungeonforge Engine library.
//!
//! Turn-based combat core of an LLM-narrated RPG: an entity store driven by
//! two processor pipelines (home and dungeon), per-agent chat memory and a
//! gateway to the model endpoint.
//!
//! ## Structure
//!
//! - `ecs/` - Entity store, matchers and reactive collectors
//! - `memory` - Per-agent short-term chat logs
//! - `chat/` - Model gateway and structured reply parsing
//! - `pipeline/` - Processor trait and the tick runner
//! - `game/` - The running world and its operations
//! - `processors/` - Home planning and combat processors
//! - `session` - One game plus its two pipelines
//! - `infrastructure/` - Port traits and their adapters
//! - `api/` - Player command handling

pub mod api;
pub mod chat;
pub mod demo;
pub mod ecs;
pub mod game;
pub mod infrastructure;
pub mod memory;
pub mod pipeline;
pub mod player;
pub mod processors;
pub mod prompt_templates;
pub mod session;

/// Scripted chat endpoint, in-memory storage and a small authored world.
#[cfg(test)]
pub mod test_fixtures;

/// Whole-game scenarios driven through player commands.
#[cfg(test)]
mod e2e_tests;

pub use game::TcgGame;
pub use session::GameSession;
