//! World document: everything needed to restore a running world.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dungeon::Dungeon;
use crate::error::DomainError;
use crate::messages::ChatMessage;
use crate::prototypes::Boot;

/// Bumped whenever the document layout changes incompatibly.
pub const SCHEMA_VERSION: &str = "0.0.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub name: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub name: String,
    pub components: Vec<ComponentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentShortTermMemory {
    pub name: String,
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRuntime {
    pub version: String,
    /// Last value handed out by the runtime-index allocator.
    pub runtime_index: u64,
    pub entities_snapshot: Vec<EntitySnapshot>,
    pub agents_short_term_memory: BTreeMap<String, AgentShortTermMemory>,
    pub dungeon: Dungeon,
    pub boot: Boot,
}

impl WorldRuntime {
    /// A world that has not been built yet.
    pub fn new(boot: Boot, dungeon: Dungeon) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            runtime_index: 0,
            entities_snapshot: Vec::new(),
            agents_short_term_memory: BTreeMap::new(),
            dungeon,
            boot,
        }
    }

    /// True once entities have been built or restored at least once.
    pub fn has_entities(&self) -> bool {
        !self.entities_snapshot.is_empty()
    }

    pub fn ensure_compatible(&self) -> Result<(), DomainError> {
        if self.version != SCHEMA_VERSION {
            return Err(DomainError::validation(format!(
                "incompatible world version {} (expected {SCHEMA_VERSION})",
                self.version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_world_is_compatible_and_empty() {
        let world = WorldRuntime::new(Boot::default(), Dungeon::default());
        assert!(world.ensure_compatible().is_ok());
        assert!(!world.has_entities());
    }

    #[test]
    fn other_versions_are_rejected() {
        let mut world = WorldRuntime::new(Boot::default(), Dungeon::default());
        world.version = "0.0.0".into();
        assert!(world.ensure_compatible().is_err());
    }
}
