//! The running world.
//!
//! [`TcgGame`] owns the entity store, every agent's memory, the persisted
//! world document and the player proxy. Processors receive it as `&mut` on
//! every hook; nothing else holds a reference to it.

mod activation;
mod dungeon;
mod events;
mod query;
mod world;

use std::sync::Arc;

use dungeonforge_domain::{RuntimeIndex, WorldRuntime};

use crate::chat::ChatSystem;
use crate::ecs::EntityStore;
use crate::infrastructure::ports::RandomPort;
use crate::infrastructure::settings::Settings;
use crate::memory::AgentMemory;
use crate::player::PlayerProxy;

pub use events::ConversationCheck;

/// Which pipeline drives the next tick, derived from the player's stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    None,
    Home,
    Dungeon,
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Home => write!(f, "home"),
            Self::Dungeon => write!(f, "dungeon"),
        }
    }
}

pub struct TcgGame {
    name: String,
    pub store: EntityStore,
    pub memory: AgentMemory,
    /// Persisted document. Its entity and memory lists are only refreshed by
    /// [`TcgGame::snapshot`]; the store and memory above are authoritative.
    pub world: WorldRuntime,
    pub player: PlayerProxy,
    pub chat: ChatSystem,
    pub settings: Settings,
    random: Arc<dyn RandomPort>,
    exit_requested: bool,
}

impl TcgGame {
    /// Wrap a world document. Call [`TcgGame::load_entities`] before the first tick.
    pub fn new(
        world: WorldRuntime,
        player: PlayerProxy,
        chat: ChatSystem,
        random: Arc<dyn RandomPort>,
        settings: Settings,
    ) -> Self {
        Self {
            name: world.boot.name.clone(),
            store: EntityStore::new(),
            memory: AgentMemory::new(),
            world,
            player,
            chat,
            settings,
            random,
            exit_requested: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn random(&self) -> &dyn RandomPort {
        self.random.as_ref()
    }

    /// Hand out the next value of the world-scoped allocator.
    pub fn next_runtime_index(&mut self) -> RuntimeIndex {
        self.world.runtime_index += 1;
        RuntimeIndex::new(self.world.runtime_index)
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::worlds;

    #[test]
    fn runtime_index_is_monotonic() {
        let mut game = worlds::game_with_replies(Vec::new());
        let before = game.world.runtime_index;
        let first = game.next_runtime_index();
        let second = game.next_runtime_index();
        assert_eq!(first.get(), before + 1);
        assert_eq!(second.get(), before + 2);
    }

    #[test]
    fn exit_flag_is_sticky() {
        let mut game = worlds::game_with_replies(Vec::new());
        assert!(!game.exit_requested());
        game.request_exit();
        assert!(game.exit_requested());
    }
}
