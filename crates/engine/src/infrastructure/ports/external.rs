//! External service port traits (model endpoint, world storage).

use async_trait::async_trait;
use dungeonforge_domain::WorldRuntime;
use dungeonforge_shared::{ChatRequest, ChatResponse};

use super::error::{ChatError, PersistenceError};

// =============================================================================
// Model Endpoint
// =============================================================================

/// One request = prompt + history -> reply with at least `output`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError>;
}

// =============================================================================
// World Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorldRepo: Send + Sync {
    /// Load the runtime document of a world, `None` if it was never saved.
    async fn load_world(&self, world_name: &str) -> Result<Option<WorldRuntime>, PersistenceError>;

    /// Write the runtime document, replacing the previous one.
    async fn save_world(&self, world: &WorldRuntime) -> Result<(), PersistenceError>;

    /// Write a copy into the player's save slot.
    async fn save_player_slot(
        &self,
        player_name: &str,
        world: &WorldRuntime,
    ) -> Result<(), PersistenceError>;
}
