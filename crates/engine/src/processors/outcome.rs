//! Deaths, the combat result and the post-combat journal.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dungeonforge_domain::components::{
    DeathComponent, DestroyComponent, HeroComponent, MonsterComponent,
};
use dungeonforge_domain::{CombatResult, EntityId, GameEvent};
use dungeonforge_shared::ChatRequest;

use super::{attach, history, tags};
use crate::game::{GameState, TcgGame};
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

/// Combatants on the player's stage, dead or alive.
fn combatants(game: &TcgGame) -> Option<(EntityId, Vec<EntityId>)> {
    if game.game_state() != GameState::Dungeon {
        return None;
    }
    let stage = game.player_stage()?;
    let actors = game
        .actors_on_stage(stage)
        .into_iter()
        .filter(|&e| game.combat_role(e).is_some())
        .collect();
    Some((stage, actors))
}

// =============================================================================
// Death
// =============================================================================

/// Marks combatants at zero hp dead. Dead monsters are also scheduled for
/// destruction; dead heroes stay for the journal.
pub struct CombatDeathProcessor;

#[async_trait]
impl Processor for CombatDeathProcessor {
    fn name(&self) -> &'static str {
        "combat_death"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        let Some((stage, actors)) = combatants(game) else {
            return;
        };
        let fallen: Vec<EntityId> = actors
            .into_iter()
            .filter(|&e| !game.store.has::<DeathComponent>(e))
            .filter(|&e| game.combat_role(e).is_some_and(|r| r.profile.is_dead()))
            .collect();

        for actor in fallen {
            let name = game.entity_name(actor).to_string();
            attach(game, actor, DeathComponent { name: name.clone() });
            if game.store.has::<MonsterComponent>(actor) {
                attach(game, actor, DestroyComponent { name: name.clone() });
            }
            let event = GameEvent::CombatDeathEvent {
                message: format!("# Event! {name} has fallen!"),
                actor: name.clone(),
            };
            game.broadcast_event(stage, &event, &[]);
            tracing::info!(actor = %name, "Combatant died");
        }
    }
}

// =============================================================================
// Result
// =============================================================================

/// Decides the combat once one side is wiped out. A hero win is checked
/// first, so a round that kills everyone counts as won.
pub struct CombatResultProcessor;

impl CombatResultProcessor {
    fn decide(game: &TcgGame, actors: &[EntityId]) -> CombatResult {
        let all_dead = |side: &dyn Fn(EntityId) -> bool| {
            actors
                .iter()
                .filter(|&&e| side(e))
                .all(|&e| game.store.has::<DeathComponent>(e))
        };
        if all_dead(&|e| game.store.has::<MonsterComponent>(e)) {
            CombatResult::HeroWin
        } else if all_dead(&|e| game.store.has::<HeroComponent>(e)) {
            CombatResult::HeroLose
        } else {
            CombatResult::None
        }
    }
}

#[async_trait]
impl Processor for CombatResultProcessor {
    fn name(&self) -> &'static str {
        "combat_result"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        if !game.world.dungeon.engagement.is_ongoing_phase() {
            return;
        }
        let Some((stage, actors)) = combatants(game) else {
            return;
        };
        let result = Self::decide(game, &actors);
        if result == CombatResult::None {
            return;
        }
        if let Err(e) = game.world.dungeon.engagement.combat_complete(result) {
            tracing::warn!(error = %e, "Combat could not be completed");
            return;
        }

        let stage_name = game.entity_name(stage).to_string();
        let notice = match result {
            CombatResult::HeroWin => "# Combat over! You won!",
            _ => "# Combat over! You lost!",
        };
        for hero in actors
            .into_iter()
            .filter(|&e| game.store.has::<HeroComponent>(e))
        {
            let name = game.entity_name(hero).to_string();
            let result_tags = BTreeMap::from([(tags::COMBAT_RESULT.to_string(), stage_name.clone())]);
            game.memory.append_human_with_tags(&name, notice, result_tags);
        }
        tracing::info!(stage = %stage_name, result = %result, "Combat complete");
    }
}

// =============================================================================
// Journal
// =============================================================================

/// After a completed combat every hero writes a journal entry, which replaces
/// the combat's slice of its memory. The combat then moves to post-wait.
pub struct CombatCompleteProcessor;

#[async_trait]
impl Processor for CombatCompleteProcessor {
    fn name(&self) -> &'static str {
        "combat_complete"
    }

    async fn a_execute2(&mut self, game: &mut TcgGame) {
        if !game.world.dungeon.engagement.is_complete_phase() {
            return;
        }
        let Some((stage, actors)) = combatants(game) else {
            return;
        };
        let stage_name = game.entity_name(stage).to_string();
        let result = if game.world.dungeon.engagement.has_hero_won() {
            "You won."
        } else {
            "You lost."
        };
        let prompt = prompt_templates::build(
            keys::COMBAT_JOURNAL,
            &[("stage", &stage_name), ("result", result)],
        );

        let heroes: Vec<(EntityId, String)> = actors
            .into_iter()
            .filter(|&e| game.store.has::<HeroComponent>(e))
            .map(|e| (e, game.entity_name(e).to_string()))
            .collect();
        let requests = heroes
            .iter()
            .map(|(_, name)| ChatRequest::new(name, prompt.clone(), history(game, name)))
            .collect();
        let responses = game.chat.gather(requests).await;

        let player = game.player_entity();
        for ((hero, name), response) in heroes.into_iter().zip(responses) {
            let journal = match response {
                Ok(r) if !r.output.trim().is_empty() => r.output,
                Ok(_) => {
                    tracing::warn!(actor = %name, "Empty combat journal");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(actor = %name, error = %e, "Combat journal failed");
                    continue;
                }
            };
            let summary = format!(
                "# Event! You went through a combat!\nStage: {stage_name}\nYou recorded:\n{journal}"
            );
            let compressed = game.memory.compress_between_tags(
                &name,
                (tags::COMBAT_KICKOFF, &stage_name),
                (tags::COMBAT_RESULT, &stage_name),
                summary.clone(),
            );
            if !compressed {
                tracing::warn!(actor = %name, "Combat tags missing, memory left as is");
            }
            if let Some(combat) = game.world.dungeon.engagement.last_combat_mut() {
                combat.summarize_report.insert(name.clone(), summary.clone());
            }
            if Some(hero) == player {
                let event = GameEvent::CombatCompleteEvent {
                    message: summary.clone(),
                    actor: name.clone(),
                    summary,
                };
                game.player.add_notification(name, event);
            }
        }

        if let Err(e) = game.world.dungeon.engagement.combat_post_wait() {
            tracing::warn!(error = %e, "Combat could not move to post-wait");
        }
    }
}
