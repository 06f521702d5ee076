//! Authored world data: prototypes, instances and the boot document.
//!
//! Prototypes are read-only once the world has booted. Instances reference a
//! prototype by name and carry their own guid and kickoff message.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::Guid;
use crate::rpg::BaseAttributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorType {
    Hero,
    Monster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageType {
    Home,
    Dungeon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPrototype {
    pub name: String,
    pub system_message: String,
    pub appearance: String,
    pub actor_type: ActorType,
    pub attributes: BaseAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePrototype {
    pub name: String,
    pub system_message: String,
    pub stage_type: StageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSystemPrototype {
    pub name: String,
    pub system_message: String,
}

/// Catalog of prototypes keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataBase {
    pub actors: BTreeMap<String, ActorPrototype>,
    pub stages: BTreeMap<String, StagePrototype>,
    pub world_systems: BTreeMap<String, WorldSystemPrototype>,
}

impl DataBase {
    pub fn actor(&self, name: &str) -> Result<&ActorPrototype, DomainError> {
        self.actors
            .get(name)
            .ok_or_else(|| DomainError::not_found("ActorPrototype", name))
    }

    pub fn stage(&self, name: &str) -> Result<&StagePrototype, DomainError> {
        self.stages
            .get(name)
            .ok_or_else(|| DomainError::not_found("StagePrototype", name))
    }

    pub fn world_system(&self, name: &str) -> Result<&WorldSystemPrototype, DomainError> {
        self.world_systems
            .get(name)
            .ok_or_else(|| DomainError::not_found("WorldSystemPrototype", name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorInstance {
    pub name: String,
    pub prototype: String,
    pub guid: Guid,
    pub kick_off_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInstance {
    pub name: String,
    pub prototype: String,
    pub guid: Guid,
    pub kick_off_message: String,
    pub actors: Vec<ActorInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSystemInstance {
    pub name: String,
    pub prototype: String,
    pub guid: Guid,
    pub kick_off_message: String,
}

/// Immutable starting point of a world.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Boot {
    pub name: String,
    pub epoch_script: String,
    pub stages: Vec<StageInstance>,
    pub world_systems: Vec<WorldSystemInstance>,
    pub data_base: DataBase,
}

impl Boot {
    /// Check that every instance resolves to a prototype and that names are unique.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut names = BTreeSet::new();
        let mut claim = |name: &str| -> Result<(), DomainError> {
            if name.is_empty() {
                return Err(DomainError::validation("instance name cannot be empty"));
            }
            if !names.insert(name.to_string()) {
                return Err(DomainError::validation(format!(
                    "duplicate instance name: {name}"
                )));
            }
            Ok(())
        };

        for world_system in &self.world_systems {
            claim(&world_system.name)?;
            self.data_base.world_system(&world_system.prototype)?;
        }
        for stage in &self.stages {
            claim(&stage.name)?;
            self.data_base.stage(&stage.prototype)?;
            for actor in &stage.actors {
                claim(&actor.name)?;
                self.data_base.actor(&actor.prototype)?;
            }
        }
        Ok(())
    }
}
