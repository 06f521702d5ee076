//! Building, restoring and snapshotting entities.

use dungeonforge_domain::components::{
    ActorComponent, AppearanceComponent, DungeonComponent, EnvironmentComponent, HeroComponent,
    HomeComponent, KickOffMessageComponent, MonsterComponent, PlayerComponent, RuntimeComponent,
    StageComponent, WorldSystemComponent,
};
use dungeonforge_domain::{
    ActorInstance, ActorType, Component, DomainError, EntityId, EntitySnapshot, Guid, GuidTag,
    StageInstance, StageType, WorldSystemInstance,
};

use super::TcgGame;

/// Where a spawned entity's guid comes from.
#[derive(Debug, Clone, Copy)]
pub(super) enum GuidSource {
    /// The authored instance's own guid.
    Authored,
    /// Composed from the runtime index allocated for the entity.
    Runtime,
}

impl TcgGame {
    /// Build entities from the snapshot when there is one, otherwise from boot data.
    pub fn load_entities(&mut self) -> Result<(), DomainError> {
        if self.world.has_entities() {
            self.restore_entities()
        } else {
            self.build_entities()
        }
    }

    /// First boot: world systems, then actors, then stages, then the player marker.
    pub fn build_entities(&mut self) -> Result<(), DomainError> {
        self.world.boot.validate()?;

        let world_systems = self.world.boot.world_systems.clone();
        for instance in &world_systems {
            self.spawn_world_system(instance)?;
        }

        let stages = self.world.boot.stages.clone();
        for stage in &stages {
            for actor in &stage.actors {
                self.spawn_actor(actor, &stage.name, GuidSource::Authored)?;
            }
        }
        for stage in &stages {
            self.spawn_stage(stage, GuidSource::Authored)?;
        }

        self.attach_player()?;
        self.snapshot()?;
        tracing::info!(
            world = %self.name,
            entities = self.store.len(),
            "World entities built"
        );
        Ok(())
    }

    /// Rebuild entities and memories from the persisted document.
    ///
    /// Components whose name is unknown (or whose payload no longer decodes)
    /// are skipped with a warning.
    pub fn restore_entities(&mut self) -> Result<(), DomainError> {
        self.world.ensure_compatible()?;

        let snapshots = self.world.entities_snapshot.clone();
        for snapshot in &snapshots {
            let entity = self.store.create_entity(snapshot.name.clone())?;
            for component in &snapshot.components {
                match Component::from_snapshot(component) {
                    Ok(component) => self.store.replace_component(entity, component)?,
                    Err(e) => tracing::warn!(
                        entity = %snapshot.name,
                        component = %component.name,
                        error = %e,
                        "Skipping component while restoring"
                    ),
                }
            }
        }

        for (name, memory) in &self.world.agents_short_term_memory {
            self.memory
                .initialize_from_snapshot(name, memory.chat_history.clone());
        }

        tracing::info!(
            world = %self.name,
            entities = self.store.len(),
            runtime_index = self.world.runtime_index,
            "World entities restored"
        );
        Ok(())
    }

    /// Refresh the document's entity and memory lists from live state.
    pub fn snapshot(&mut self) -> Result<(), DomainError> {
        let mut entities = Vec::with_capacity(self.store.len());
        for entity in self.store.entity_ids() {
            let Some(name) = self.store.name(entity) else {
                continue;
            };
            let components = self
                .store
                .components(entity)
                .map(Component::to_snapshot)
                .collect::<Result<Vec<_>, _>>()?;
            entities.push(EntitySnapshot {
                name: name.to_string(),
                components,
            });
        }
        self.world.entities_snapshot = entities;
        self.world.agents_short_term_memory = self.memory.to_snapshot();
        Ok(())
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    fn spawn_world_system(&mut self, instance: &WorldSystemInstance) -> Result<EntityId, DomainError> {
        let prototype = self
            .world
            .boot
            .data_base
            .world_system(&instance.prototype)?
            .clone();
        let guid = (GuidTag::WorldSystem, instance.guid, GuidSource::Authored);
        let entity = self.spawn_named(&instance.name, guid, &prototype.system_message)?;
        self.store.replace(
            entity,
            WorldSystemComponent {
                name: instance.name.clone(),
            },
        )?;
        self.attach_kick_off(entity, &instance.name, &instance.kick_off_message)?;
        Ok(entity)
    }

    pub(super) fn spawn_actor(
        &mut self,
        instance: &ActorInstance,
        stage_name: &str,
        source: GuidSource,
    ) -> Result<EntityId, DomainError> {
        let prototype = self.world.boot.data_base.actor(&instance.prototype)?.clone();
        let guid = (GuidTag::Actor, instance.guid, source);
        let entity = self.spawn_named(&instance.name, guid, &prototype.system_message)?;
        self.store.replace(
            entity,
            ActorComponent {
                name: instance.name.clone(),
                current_stage: stage_name.to_string(),
            },
        )?;
        self.store.replace(
            entity,
            AppearanceComponent {
                name: instance.name.clone(),
                appearance: prototype.appearance.clone(),
            },
        )?;
        match prototype.actor_type {
            ActorType::Hero => self.store.replace(
                entity,
                HeroComponent {
                    name: instance.name.clone(),
                },
            )?,
            ActorType::Monster => self.store.replace(
                entity,
                MonsterComponent {
                    name: instance.name.clone(),
                },
            )?,
        }
        self.attach_kick_off(entity, &instance.name, &instance.kick_off_message)?;
        Ok(entity)
    }

    pub(super) fn spawn_stage(
        &mut self,
        instance: &StageInstance,
        source: GuidSource,
    ) -> Result<EntityId, DomainError> {
        let prototype = self.world.boot.data_base.stage(&instance.prototype)?.clone();
        let guid = (GuidTag::Stage, instance.guid, source);
        let entity = self.spawn_named(&instance.name, guid, &prototype.system_message)?;
        self.store.replace(
            entity,
            StageComponent {
                name: instance.name.clone(),
            },
        )?;
        self.store.replace(
            entity,
            EnvironmentComponent {
                name: instance.name.clone(),
                narrate: String::new(),
            },
        )?;
        match prototype.stage_type {
            StageType::Home => self.store.replace(
                entity,
                HomeComponent {
                    name: instance.name.clone(),
                    action_order: instance.actors.iter().map(|a| a.name.clone()).collect(),
                },
            )?,
            StageType::Dungeon => self.store.replace(
                entity,
                DungeonComponent {
                    name: instance.name.clone(),
                },
            )?,
        }
        self.attach_kick_off(entity, &instance.name, &instance.kick_off_message)?;
        Ok(entity)
    }

    fn spawn_named(
        &mut self,
        name: &str,
        (tag, authored, source): (GuidTag, Guid, GuidSource),
        system_message: &str,
    ) -> Result<EntityId, DomainError> {
        let entity = self.store.create_entity(name)?;
        let runtime_index = self.next_runtime_index();
        let guid = match source {
            GuidSource::Authored => authored,
            GuidSource::Runtime => Guid::runtime(tag, runtime_index),
        };
        self.store.replace(
            entity,
            RuntimeComponent {
                name: name.to_string(),
                runtime_index,
                guid,
            },
        )?;
        self.memory.append_system(name, system_message);
        Ok(entity)
    }

    fn attach_kick_off(
        &mut self,
        entity: EntityId,
        name: &str,
        content: &str,
    ) -> Result<(), DomainError> {
        if content.is_empty() {
            return Ok(());
        }
        self.store.replace(
            entity,
            KickOffMessageComponent {
                name: name.to_string(),
                content: content.to_string(),
            },
        )
    }

    fn attach_player(&mut self) -> Result<(), DomainError> {
        let actor = self.player.actor().to_string();
        let entity = self
            .store
            .entity_by_name(&actor)
            .ok_or_else(|| DomainError::not_found("Actor", actor.clone()))?;
        self.store.replace(
            entity,
            PlayerComponent {
                player_name: self.player.name().to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use dungeonforge_domain::components::{
        ActorComponent, HeroComponent, HomeComponent, KickOffMessageComponent, PlayerComponent,
        RuntimeComponent,
    };
    use dungeonforge_domain::{ComponentSnapshot, MessageRole};

    use crate::test_fixtures::worlds;

    #[test]
    fn build_creates_actors_stages_and_player_marker() {
        let game = worlds::game_with_replies(Vec::new());

        let aria = game.store.entity_by_name(worlds::HERO).expect("hero");
        assert!(game.store.has::<HeroComponent>(aria));
        assert_eq!(
            game.store.get::<ActorComponent>(aria).map(|a| a.current_stage.as_str()),
            Some(worlds::CAMP)
        );
        assert_eq!(
            game.store.get::<PlayerComponent>(aria).map(|p| p.player_name.as_str()),
            Some(worlds::PLAYER)
        );

        let camp = game.store.entity_by_name(worlds::CAMP).expect("camp");
        let order = &game
            .store
            .get::<HomeComponent>(camp)
            .expect("home")
            .action_order;
        assert_eq!(order, &vec![worlds::HERO.to_string(), worlds::COMPANION.to_string()]);
    }

    #[test]
    fn every_entity_gets_a_system_message_and_runtime_index() {
        let game = worlds::game_with_replies(Vec::new());
        let mut indices = Vec::new();
        for entity in game.store.entity_ids() {
            let name = game.store.name(entity).expect("name");
            let history = game.memory.history(name);
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].role(), MessageRole::System);
            indices.push(
                game.store
                    .get::<RuntimeComponent>(entity)
                    .expect("runtime")
                    .runtime_index,
            );
        }
        let mut sorted = indices.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), indices.len());
    }

    #[test]
    fn empty_kickoff_messages_are_not_attached() {
        let game = worlds::game_with_replies(Vec::new());
        let aria = game.store.entity_by_name(worlds::HERO).expect("hero");
        assert!(!game.store.has::<KickOffMessageComponent>(aria));
    }

    #[test]
    fn restore_reproduces_entities_and_memories() {
        let mut game = worlds::game_with_replies(Vec::new());
        game.memory.append_human(worlds::HERO, "The fire crackles.");
        game.snapshot().expect("snapshot");

        let mut restored = worlds::restore(game.world.clone());
        restored.snapshot().expect("snapshot");

        assert_eq!(restored.world.entities_snapshot, game.world.entities_snapshot);
        assert_eq!(restored.memory, game.memory);
        assert_eq!(restored.world.runtime_index, game.world.runtime_index);
    }

    #[test]
    fn unknown_components_are_skipped_on_restore() {
        let mut game = worlds::game_with_replies(Vec::new());
        game.snapshot().expect("snapshot");
        let mut world = game.world.clone();
        world.entities_snapshot[0].components.push(ComponentSnapshot {
            name: "FlyingCarpetComponent".into(),
            data: serde_json::json!({"name": "rug"}),
        });

        let restored = worlds::restore(world);
        assert_eq!(restored.store.len(), game.store.len());
    }
}
