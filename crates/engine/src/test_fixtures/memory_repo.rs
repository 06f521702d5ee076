//! In-memory world store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dungeonforge_domain::WorldRuntime;

use crate::infrastructure::ports::{PersistenceError, WorldRepo};

#[derive(Debug, Default)]
pub struct MemoryWorldRepo {
    worlds: Mutex<BTreeMap<String, WorldRuntime>>,
    slots: Mutex<BTreeMap<(String, String), WorldRuntime>>,
}

impl MemoryWorldRepo {
    pub fn with_world(world: WorldRuntime) -> Self {
        let repo = Self::default();
        repo.worlds
            .lock()
            .expect("worlds lock")
            .insert(world.boot.name.clone(), world);
        repo
    }

    pub fn saved_world(&self, world_name: &str) -> Option<WorldRuntime> {
        self.worlds.lock().expect("worlds lock").get(world_name).cloned()
    }

    pub fn player_slot(&self, player_name: &str, world_name: &str) -> Option<WorldRuntime> {
        self.slots
            .lock()
            .expect("slots lock")
            .get(&(player_name.to_string(), world_name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl WorldRepo for MemoryWorldRepo {
    async fn load_world(&self, world_name: &str) -> Result<Option<WorldRuntime>, PersistenceError> {
        Ok(self.saved_world(world_name))
    }

    async fn save_world(&self, world: &WorldRuntime) -> Result<(), PersistenceError> {
        self.worlds
            .lock()
            .expect("worlds lock")
            .insert(world.boot.name.clone(), world.clone());
        Ok(())
    }

    async fn save_player_slot(
        &self,
        player_name: &str,
        world: &WorldRuntime,
    ) -> Result<(), PersistenceError> {
        self.slots
            .lock()
            .expect("slots lock")
            .insert((player_name.to_string(), world.boot.name.clone()), world.clone());
        Ok(())
    }
}
