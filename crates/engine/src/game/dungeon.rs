//! Dungeon progression: launch, next level, return home, teleport.

use dungeonforge_domain::components::{
    CombatRoleComponent, DeathComponent, HandComponent, XCardPlayerComponent,
};
use dungeonforge_domain::{Combat, ComponentKind, DomainError, Dungeon, EntityId};

use super::world::GuidSource;
use super::TcgGame;
use crate::ecs::Matcher;

impl TcgGame {
    pub fn heroes(&self) -> Vec<EntityId> {
        self.store
            .get_group(&Matcher::new().all_of(&[ComponentKind::HeroComponent]))
    }

    /// Spawn every level of the dungeon, move the heroes into the first one
    /// and open its combat.
    pub fn launch_dungeon(&mut self) -> Result<(), DomainError> {
        if self.world.dungeon.is_empty() {
            return Err(DomainError::validation("there is no dungeon to enter"));
        }
        if self.world.dungeon.is_started() {
            return Err(DomainError::invalid_state_transition(format!(
                "dungeon {} was already entered (position {})",
                self.world.dungeon.name, self.world.dungeon.position
            )));
        }

        let levels = self.world.dungeon.levels.clone();
        for level in &levels {
            for actor in &level.actors {
                if self.store.entity_by_name(&actor.name).is_some() {
                    return Err(DomainError::validation(format!(
                        "dungeon actor {} already exists",
                        actor.name
                    )));
                }
                self.spawn_actor(actor, &level.name, GuidSource::Runtime)?;
            }
        }
        for level in &levels {
            self.spawn_stage(level, GuidSource::Runtime)?;
        }

        self.world.dungeon.advance_level();
        self.enter_current_level()
    }

    /// Move on after a won combat.
    pub fn advance_next_dungeon(&mut self) -> Result<(), DomainError> {
        if !self.world.dungeon.advance_level() {
            return Err(DomainError::validation(format!(
                "dungeon {} has no level after position {}",
                self.world.dungeon.name, self.world.dungeon.position
            )));
        }
        self.enter_current_level()
    }

    fn enter_current_level(&mut self) -> Result<(), DomainError> {
        let level = self
            .world
            .dungeon
            .current_level()
            .map(|l| l.name.clone())
            .ok_or_else(|| DomainError::validation("dungeon cursor is past the last level"))?;
        let stage = self
            .stage_entity(&level)
            .ok_or_else(|| DomainError::not_found("Stage", level.clone()))?;
        let heroes = self.heroes();
        if heroes.is_empty() {
            return Err(DomainError::validation("no heroes can enter the dungeon"));
        }

        let hint = if self.world.dungeon.position == 0 {
            format!("# Notice! Your adventure begins. You are about to enter the dungeon: {level}")
        } else {
            format!("# Notice! Your adventure continues. You are about to enter the next dungeon: {level}")
        };
        for &hero in &heroes {
            let name = self.entity_name(hero).to_string();
            self.memory.append_human(&name, hint.clone());
        }

        self.stage_transition(&heroes, stage)?;
        self.world
            .dungeon
            .engagement
            .combat_kickoff(Combat::new(level.clone()))?;
        tracing::info!(dungeon = %self.world.dungeon.name, level = %level, "Entered dungeon level");
        Ok(())
    }

    /// Bring the heroes back to the first home stage and discard the dungeon.
    pub fn return_to_home(&mut self) -> Result<(), DomainError> {
        let home = self
            .store
            .get_group(&Matcher::new().all_of(&[ComponentKind::HomeComponent]))
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found("Stage", "home"))?;
        let heroes = self.heroes();
        if heroes.is_empty() {
            return Err(DomainError::validation("no heroes to bring home"));
        }

        let hint = format!(
            "# Notice! The adventure is over. You are returning to: {}",
            self.entity_name(home)
        );
        for &hero in &heroes {
            let name = self.entity_name(hero).to_string();
            self.memory.append_human(&name, hint.clone());
        }
        self.stage_transition(&heroes, home)?;

        let dungeon = std::mem::take(&mut self.world.dungeon);
        self.destroy_dungeon_entities(&dungeon);

        for hero in heroes {
            self.store.remove::<DeathComponent>(hero);
            self.store.remove::<XCardPlayerComponent>(hero);
            self.store.remove::<HandComponent>(hero);
            self.store.remove::<CombatRoleComponent>(hero);
        }
        tracing::info!(dungeon = %dungeon.name, "Returned home");
        Ok(())
    }

    fn destroy_dungeon_entities(&mut self, dungeon: &Dungeon) {
        for level in &dungeon.levels {
            for actor in &level.actors {
                if let Some(entity) = self.actor_entity(&actor.name) {
                    self.destroy_entity(entity);
                }
            }
        }
        for level in &dungeon.levels {
            if let Some(entity) = self.stage_entity(&level.name) {
                self.destroy_entity(entity);
            }
        }
    }

    /// Remove an entity and its memory.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if let Some(name) = self.store.name(entity).map(str::to_string) {
            self.memory.remove(&name);
        }
        self.store.destroy_entity(entity)
    }

    /// Debug-only jump of the player's actor to any stage.
    pub fn teleport(&mut self, stage_name: &str) -> Result<(), DomainError> {
        let stage = self
            .stage_entity(stage_name)
            .ok_or_else(|| DomainError::not_found("Stage", stage_name))?;
        let player = self
            .player_entity()
            .ok_or_else(|| DomainError::not_found("Player", self.player.name()))?;
        self.stage_transition(&[player], stage)
    }
}
