//! Read-only lookups over the entity store.

use std::collections::BTreeMap;

use dungeonforge_domain::components::{
    ActorComponent, AppearanceComponent, CombatRoleComponent, DungeonComponent, HomeComponent,
    PlayerComponent, StageComponent,
};
use dungeonforge_domain::{ActorInstance, ActorPrototype, ComponentKind, DomainError, EntityId};

use super::{GameState, TcgGame};
use crate::ecs::Matcher;

impl TcgGame {
    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.store.entity_by_name(name)
    }

    pub fn entity_name(&self, entity: EntityId) -> &str {
        self.store.name(entity).unwrap_or_default()
    }

    pub fn player_entity(&self) -> Option<EntityId> {
        self.store
            .get_group(&Matcher::new().all_of(&[ComponentKind::PlayerComponent]))
            .into_iter()
            .find(|&e| {
                self.store
                    .get::<PlayerComponent>(e)
                    .is_some_and(|p| p.player_name == self.player.name())
            })
    }

    pub fn actor_entity(&self, name: &str) -> Option<EntityId> {
        self.store
            .entity_by_name(name)
            .filter(|&e| self.store.has::<ActorComponent>(e))
    }

    pub fn stage_entity(&self, name: &str) -> Option<EntityId> {
        self.store
            .entity_by_name(name)
            .filter(|&e| self.store.has::<StageComponent>(e))
    }

    /// The stage an entity stands on; a stage is its own stage.
    pub fn stage_of(&self, entity: EntityId) -> Option<EntityId> {
        if self.store.has::<StageComponent>(entity) {
            return Some(entity);
        }
        let actor = self.store.get::<ActorComponent>(entity)?;
        self.stage_entity(&actor.current_stage)
    }

    /// Actors whose current stage is `stage`, in creation order.
    pub fn actors_on_stage(&self, stage: EntityId) -> Vec<EntityId> {
        let Some(stage_name) = self.store.name(stage) else {
            return Vec::new();
        };
        self.store
            .get_group(&Matcher::new().all_of(&[ComponentKind::ActorComponent]))
            .into_iter()
            .filter(|&e| {
                self.store
                    .get::<ActorComponent>(e)
                    .is_some_and(|a| a.current_stage == stage_name)
            })
            .collect()
    }

    pub fn player_stage(&self) -> Option<EntityId> {
        self.player_entity().and_then(|e| self.stage_of(e))
    }

    pub fn game_state(&self) -> GameState {
        match self.player_stage() {
            Some(stage) if self.store.has::<HomeComponent>(stage) => GameState::Home,
            Some(stage) if self.store.has::<DungeonComponent>(stage) => GameState::Dungeon,
            _ => GameState::None,
        }
    }

    /// Living actors with a combat role on the player's stage, in creation order.
    pub fn combat_participants(&self) -> Vec<EntityId> {
        let Some(stage) = self.player_stage() else {
            return Vec::new();
        };
        let alive = Matcher::new()
            .all_of(&[ComponentKind::CombatRoleComponent])
            .none_of(&[ComponentKind::DeathComponent]);
        self.actors_on_stage(stage)
            .into_iter()
            .filter(|&e| alive.matches(|kind| self.store.has_kind(e, kind)))
            .collect()
    }

    pub fn combat_role(&self, entity: EntityId) -> Option<&CombatRoleComponent> {
        self.store.get::<CombatRoleComponent>(entity)
    }

    /// `name -> appearance` for every actor on `stage` except `exclude`.
    pub fn appearance_mapping(
        &self,
        stage: EntityId,
        exclude: Option<EntityId>,
    ) -> BTreeMap<String, String> {
        self.actors_on_stage(stage)
            .into_iter()
            .filter(|&e| Some(e) != exclude)
            .map(|e| {
                let appearance = self
                    .store
                    .get::<AppearanceComponent>(e)
                    .map(|a| a.appearance.clone())
                    .unwrap_or_default();
                (self.entity_name(e).to_string(), appearance)
            })
            .collect()
    }

    /// Authored instance for an actor name, searching home stages then dungeon levels.
    pub fn actor_instance(&self, name: &str) -> Option<&ActorInstance> {
        self.world
            .boot
            .stages
            .iter()
            .chain(self.world.dungeon.levels.iter())
            .flat_map(|stage| stage.actors.iter())
            .find(|actor| actor.name == name)
    }

    pub fn actor_prototype(&self, name: &str) -> Result<&ActorPrototype, DomainError> {
        let instance = self
            .actor_instance(name)
            .ok_or_else(|| DomainError::not_found("ActorInstance", name))?;
        self.world.boot.data_base.actor(&instance.prototype)
    }
}
