//! Combat kickoff: every actor on the level describes the moment the fight
//! starts and reports its opening status effects.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dungeonforge_domain::components::{CombatRoleComponent, DeathComponent};
use dungeonforge_domain::rpg::format_status_effects;
use dungeonforge_domain::{EntityId, GameEvent, RpgCharacterProfile, StatusEffect};
use dungeonforge_shared::ChatRequest;
use serde::Deserialize;

use super::{actor_list, history, narrate, tags};
use crate::chat::parse_structured;
use crate::game::{GameState, TcgGame};
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

#[derive(Debug, Deserialize)]
struct CombatKickOffResponse {
    description: String,
    #[serde(default)]
    status_effects: Vec<StatusEffect>,
}

struct Pending {
    actor: EntityId,
    name: String,
    prompt: String,
    profile: RpgCharacterProfile,
}

/// Runs while the live combat is in `kickoff`. Nothing is written unless
/// every actor answers with a valid reply; the next tick retries.
pub struct CombatKickOffProcessor;

impl CombatKickOffProcessor {
    fn pending(game: &TcgGame, stage: EntityId) -> Vec<Pending> {
        let stage_name = game.entity_name(stage).to_string();
        let scene = narrate(game, stage);
        game.actors_on_stage(stage)
            .into_iter()
            .filter(|&actor| !game.store.has::<DeathComponent>(actor))
            .filter_map(|actor| {
                let name = game.entity_name(actor).to_string();
                let prototype = match game.actor_prototype(&name) {
                    Ok(prototype) => prototype,
                    Err(e) => {
                        tracing::warn!(actor = %name, error = %e, "No prototype for combat actor");
                        return None;
                    }
                };
                let profile = RpgCharacterProfile::from_attributes(prototype.attributes);
                let prompt = prompt_templates::build(
                    keys::COMBAT_KICKOFF,
                    &[
                        ("stage", &stage_name),
                        ("narrate", &scene),
                        ("actors", &actor_list(game, stage, Some(actor))),
                        ("stats", &profile.stats_prompt()),
                    ],
                );
                Some(Pending {
                    actor,
                    name,
                    prompt,
                    profile,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Processor for CombatKickOffProcessor {
    fn name(&self) -> &'static str {
        "combat_kickoff"
    }

    async fn a_execute1(&mut self, game: &mut TcgGame) {
        if game.game_state() != GameState::Dungeon
            || !game.world.dungeon.engagement.is_kickoff_phase()
        {
            return;
        }
        let Some(stage) = game.player_stage() else {
            return;
        };
        let stage_name = game.entity_name(stage).to_string();
        let pending = Self::pending(game, stage);
        if pending.is_empty() {
            tracing::warn!(stage = %stage_name, "No actors to start the combat with");
            return;
        }

        let requests = pending
            .iter()
            .map(|p| ChatRequest::new(&p.name, p.prompt.clone(), history(game, &p.name)))
            .collect();
        let responses = game.chat.gather(requests).await;

        let mut replies = Vec::with_capacity(pending.len());
        for (p, response) in pending.iter().zip(responses) {
            let parsed = response.and_then(|r| parse_structured::<CombatKickOffResponse>(&r.output));
            match parsed {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    tracing::warn!(actor = %p.name, error = %e, "Combat kickoff reply rejected");
                    return;
                }
            }
        }

        let player_actor = game.player_entity();
        for (p, reply) in pending.into_iter().zip(replies) {
            let role = CombatRoleComponent {
                name: p.name.clone(),
                profile: p.profile,
                status_effects: reply.status_effects,
            };
            let effects = format_status_effects(&role.status_effects);
            if let Err(e) = game.store.replace(p.actor, role) {
                tracing::warn!(actor = %p.name, error = %e, "Could not attach combat role");
                continue;
            }

            let kickoff_tags =
                BTreeMap::from([(tags::COMBAT_KICKOFF.to_string(), stage_name.clone())]);
            game.memory.append_human_with_tags(&p.name, p.prompt, kickoff_tags);
            game.memory.append_ai(
                &p.name,
                format!(
                    "# Combat triggered! Ready.\n{}\n## Current status effects\n{effects}",
                    reply.description
                ),
            );

            if Some(p.actor) == player_actor {
                let event = GameEvent::CombatKickOffEvent {
                    message: format!("# Event! {} enters the combat: {}", p.name, reply.description),
                    actor: p.name.clone(),
                    description: reply.description,
                };
                game.player.add_notification(p.name, event);
            }
        }

        match game.world.dungeon.engagement.combat_ongoing() {
            Ok(()) => tracing::info!(stage = %stage_name, "Combat is ongoing"),
            Err(e) => tracing::warn!(stage = %stage_name, error = %e, "Combat could not start"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dungeonforge_domain::CombatPhase;

    use super::*;
    use crate::test_fixtures::scripted_chat::ScriptedChat;
    use crate::test_fixtures::worlds;

    const KICKOFF: &str = r#"{"description":"My blade hums.","status_effects":[{"name":"Focused","description":"Sharper aim","rounds":2}]}"#;

    fn launched() -> (TcgGame, Arc<ScriptedChat>) {
        let (mut game, chat) = worlds::game_with_chat();
        game.launch_dungeon().expect("launch");
        game.player.take_notifications();
        (game, chat)
    }

    #[tokio::test]
    async fn valid_replies_start_the_combat() {
        let (mut game, chat) = launched();
        for name in [worlds::HERO, worlds::COMPANION, worlds::MONSTER] {
            chat.push(name, KICKOFF);
        }

        CombatKickOffProcessor.a_execute1(&mut game).await;

        assert_eq!(game.world.dungeon.engagement.phase(), CombatPhase::Ongoing);
        let hero = game.actor_entity(worlds::HERO).expect("hero");
        let role = game.combat_role(hero).expect("role");
        assert_eq!(role.status_effects.len(), 1);
        assert_eq!(role.profile.hp(), role.profile.max_hp());

        let history = game.memory.history(worlds::HERO);
        let tagged = &history[history.len() - 2];
        assert_eq!(tagged.tag(tags::COMBAT_KICKOFF), Some(worlds::CAVE));
        let ready = history[history.len() - 1].content();
        assert!(ready.starts_with("# Combat triggered! Ready."));
        assert!(ready.contains("Focused"));

        let notifications = game.player.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].data.event_type(), "CombatKickOffEvent");
    }

    #[tokio::test]
    async fn one_bad_reply_leaves_everything_untouched() {
        let (mut game, chat) = launched();
        chat.push(worlds::HERO, KICKOFF);
        chat.push(worlds::COMPANION, "I am ready!");
        chat.push(worlds::MONSTER, KICKOFF);
        let before = game.memory.len(worlds::HERO);

        CombatKickOffProcessor.a_execute1(&mut game).await;

        assert_eq!(game.world.dungeon.engagement.phase(), CombatPhase::KickOff);
        assert_eq!(game.memory.len(worlds::HERO), before);
        assert!(game.combat_participants().is_empty());
        assert!(game.player.notifications().is_empty());
    }

    #[tokio::test]
    async fn ignored_outside_the_kickoff_phase() {
        let (mut game, chat) = worlds::game_with_chat();
        CombatKickOffProcessor.a_execute1(&mut game).await;
        assert!(chat.requests().is_empty());
    }
}
