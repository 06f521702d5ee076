//! Test fixtures shared by unit and scenario tests.
//!
//! - `worlds` - a small authored world (two heroes, a goblin cave) and games built on it
//! - `scripted_chat` - a model endpoint answering from per-agent reply queues
//! - `memory_repo` - an in-memory world store

pub mod memory_repo;
pub mod scripted_chat;
pub mod worlds;
