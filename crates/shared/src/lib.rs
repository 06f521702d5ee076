//! Dungeonforge Shared - wire contracts between the engine and its collaborators
//!
//! - `chat` - request/reply shape of the model endpoint
//! - `commands` - player command tags accepted by the CLI/HTTP layer
//! - `responses` - numbered error codes and outbound player notifications
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, thiserror and the domain crate
//! 2. **No business logic** - Pure data types, parsing and serialization

pub mod chat;
pub mod commands;
pub mod responses;

pub use chat::{ChatRequest, ChatResponse};
pub use commands::{CommandError, PlayerCommand};
pub use responses::{ErrorCode, PlayerNotification, ResponseResult};
