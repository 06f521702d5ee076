//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod chat_client;
pub mod clock;
pub mod ports;
pub mod resilient_chat;
pub mod settings;
pub mod world_store;
