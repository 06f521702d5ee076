//! Processors shared by both pipelines.

use std::sync::Arc;

use async_trait::async_trait;
use dungeonforge_domain::components::{
    ActorComponent, DeathComponent, EnvironmentComponent, KickOffDoneComponent,
    KickOffMessageComponent, StageComponent,
};
use dungeonforge_domain::{ComponentKind, EntityId};
use dungeonforge_shared::ChatRequest;

use super::{attach, history};
use crate::ecs::Matcher;
use crate::game::TcgGame;
use crate::infrastructure::ports::{ClockPort, WorldRepo};
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

// =============================================================================
// Tick markers
// =============================================================================

#[derive(Default)]
pub struct BeginProcessor {
    ticks: u64,
}

#[async_trait]
impl Processor for BeginProcessor {
    fn name(&self) -> &'static str {
        "begin"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        self.ticks += 1;
        tracing::debug!(
            world = %game.name(),
            tick = self.ticks,
            state = %game.game_state(),
            "Tick begins"
        );
    }
}

pub struct EndProcessor;

#[async_trait]
impl Processor for EndProcessor {
    fn name(&self) -> &'static str {
        "end"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        tracing::debug!(
            world = %game.name(),
            entities = game.store.len(),
            "Tick ends"
        );
    }
}

// =============================================================================
// Kickoff
// =============================================================================

/// Sends every entity its kickoff message once and records the reply.
pub struct KickOffProcessor;

impl KickOffProcessor {
    fn prompt(game: &TcgGame, entity: EntityId, content: &str) -> String {
        let key = if game.store.has::<ActorComponent>(entity) {
            keys::KICKOFF_ACTOR
        } else if game.store.has::<StageComponent>(entity) {
            keys::KICKOFF_STAGE
        } else {
            keys::KICKOFF_WORLD_SYSTEM
        };
        prompt_templates::build(
            key,
            &[
                ("epoch_script", &game.world.boot.epoch_script),
                ("kick_off_message", content),
            ],
        )
    }
}

#[async_trait]
impl Processor for KickOffProcessor {
    fn name(&self) -> &'static str {
        "kickoff"
    }

    async fn a_execute1(&mut self, game: &mut TcgGame) {
        let pending = game.store.get_group(
            &Matcher::new()
                .all_of(&[ComponentKind::KickOffMessageComponent])
                .none_of(&[ComponentKind::KickOffDoneComponent]),
        );
        if pending.is_empty() {
            return;
        }

        let mut prompts = Vec::with_capacity(pending.len());
        let mut requests = Vec::with_capacity(pending.len());
        for entity in pending {
            let name = game.entity_name(entity).to_string();
            let content = game
                .store
                .get::<KickOffMessageComponent>(entity)
                .map(|k| k.content.clone())
                .unwrap_or_default();
            let prompt = Self::prompt(game, entity, &content);
            requests.push(ChatRequest::new(&name, prompt.clone(), history(game, &name)));
            prompts.push((entity, name, prompt));
        }

        let responses = game.chat.gather(requests).await;
        for ((entity, name, prompt), response) in prompts.into_iter().zip(responses) {
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(agent = %name, error = %e, "Kickoff failed; will retry next tick");
                    continue;
                }
            };
            game.memory.append_human(&name, prompt);
            game.memory.append_ai(&name, response.output.clone());
            if game.store.has::<StageComponent>(entity) {
                attach(
                    game,
                    entity,
                    EnvironmentComponent {
                        name: name.clone(),
                        narrate: response.output.clone(),
                    },
                );
            }
            attach(
                game,
                entity,
                KickOffDoneComponent {
                    name,
                    response: response.output,
                },
            );
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

fn entities_with_actions(game: &TcgGame) -> Vec<EntityId> {
    game.store
        .get_group(&Matcher::new().any_of(ComponentKind::ACTIONS))
}

fn remove_kinds(game: &mut TcgGame, entity: EntityId, kinds: &[ComponentKind]) {
    for &kind in kinds {
        game.store.remove_kind(entity, kind);
    }
}

/// Drops actions that cannot be carried out: on entities that are neither
/// actor nor stage, or on the dead.
pub struct PreActionProcessor;

#[async_trait]
impl Processor for PreActionProcessor {
    fn name(&self) -> &'static str {
        "pre_action"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        for entity in entities_with_actions(game) {
            let placed = game.store.has::<ActorComponent>(entity)
                || game.store.has::<StageComponent>(entity);
            let dead = game.store.has::<DeathComponent>(entity);
            if placed && !dead {
                continue;
            }
            tracing::warn!(
                entity = %game.entity_name(entity),
                dead,
                "Dropping actions of an entity that cannot act"
            );
            remove_kinds(game, entity, ComponentKind::ACTIONS);
        }
    }
}

/// Clears every action at the end of the tick.
pub struct PostActionProcessor;

#[async_trait]
impl Processor for PostActionProcessor {
    fn name(&self) -> &'static str {
        "post_action"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        for entity in entities_with_actions(game) {
            remove_kinds(game, entity, ComponentKind::ACTIONS);
        }
    }
}

pub(super) fn remove_permits(game: &mut TcgGame) {
    let holders = game
        .store
        .get_group(&Matcher::new().any_of(ComponentKind::PERMITS));
    for entity in holders {
        remove_kinds(game, entity, ComponentKind::PERMITS);
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

pub struct DestroyEntityProcessor;

#[async_trait]
impl Processor for DestroyEntityProcessor {
    fn name(&self) -> &'static str {
        "destroy_entity"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        let doomed = game
            .store
            .get_group(&Matcher::new().all_of(&[ComponentKind::DestroyComponent]));
        for entity in doomed {
            let name = game.entity_name(entity).to_string();
            if game.destroy_entity(entity) {
                tracing::info!(entity = %name, "Entity destroyed");
            }
        }
    }
}

/// Snapshots the world and writes it to the world file and the player's slot.
///
/// A failed write is logged and asks the session to stop.
pub struct SaveProcessor {
    repo: Arc<dyn WorldRepo>,
    clock: Arc<dyn ClockPort>,
}

impl SaveProcessor {
    pub fn new(repo: Arc<dyn WorldRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl Processor for SaveProcessor {
    fn name(&self) -> &'static str {
        "save"
    }

    async fn a_execute2(&mut self, game: &mut TcgGame) {
        if let Err(e) = game.snapshot() {
            tracing::error!(world = %game.name(), error = %e, "Snapshot failed");
            game.request_exit();
            return;
        }
        if let Err(e) = self.repo.save_world(&game.world).await {
            tracing::error!(world = %game.name(), error = %e, "Saving world failed");
            game.request_exit();
            return;
        }
        if let Err(e) = self
            .repo
            .save_player_slot(game.player.name(), &game.world)
            .await
        {
            tracing::error!(
                world = %game.name(),
                player = %game.player.name(),
                error = %e,
                "Saving player slot failed"
            );
            game.request_exit();
            return;
        }
        tracing::debug!(
            world = %game.name(),
            saved_at = %self.clock.now(),
            "World saved"
        );
    }
}
