//! Dungeonforge domain: the model catalog shared by the engine and its clients.
//!
//! - `components` - entity components as one tagged sum type
//! - `engagement` / `dungeon` - the combat state machine and level cursor
//! - `prototypes` - authored, read-only world data
//! - `snapshot` - the persisted world document

extern crate self as dungeonforge_domain;

pub mod components;
pub mod dungeon;
pub mod engagement;
pub mod error;
pub mod events;
pub mod ids;
pub mod messages;
pub mod prototypes;
pub mod rpg;
pub mod snapshot;

pub use components::{Component, ComponentKind, ComponentType};
pub use dungeon::Dungeon;
pub use engagement::{Combat, CombatPhase, CombatResult, Engagement, Round};
pub use error::DomainError;
pub use events::GameEvent;
pub use ids::{EntityId, Guid, GuidTag, RuntimeIndex};
pub use messages::{ChatMessage, MessageRole};
pub use prototypes::{
    ActorInstance, ActorPrototype, ActorType, Boot, DataBase, StageInstance, StagePrototype,
    StageType, WorldSystemInstance, WorldSystemPrototype,
};
pub use rpg::{
    settle_status_effects, BaseAttributes, HandDetail, HpChange, RpgCharacterProfile, Skill,
    StatusEffect, StatusEffectSettlement,
};
pub use snapshot::{
    AgentShortTermMemory, ComponentSnapshot, EntitySnapshot, WorldRuntime, SCHEMA_VERSION,
};
