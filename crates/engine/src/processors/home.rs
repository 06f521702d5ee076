//! Home pipeline: permits, actor plans and the reactions to home actions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dungeonforge_domain::components::{
    ActorPermit, AnnounceAction, EnterStageAction, HomeComponent, MindVoiceAction, PlanningPermit,
    SpeakAction, StagePermit, WhisperAction,
};
use dungeonforge_domain::{ComponentKind, EntityId, GameEvent};
use dungeonforge_shared::ChatRequest;
use serde::Deserialize;

use super::common::remove_permits;
use super::{actor_list, attach, history, narrate};
use crate::chat::parse_structured;
use crate::ecs::{GroupEvent, Matcher};
use crate::game::{ConversationCheck, TcgGame};
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

// =============================================================================
// Permits
// =============================================================================

/// Grants this tick's planning permits on the player's home stage.
///
/// Actor permits go round-robin through `HomeComponent::action_order`,
/// skipping the player's own actor; granted names move to the back.
pub struct HomePreProcessor;

#[async_trait]
impl Processor for HomePreProcessor {
    fn name(&self) -> &'static str {
        "home_pre"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        let Some(stage) = game.player_stage() else {
            return;
        };
        let Some(mut home) = game.store.get::<HomeComponent>(stage).cloned() else {
            return;
        };

        let stage_name = game.entity_name(stage).to_string();
        attach(game, stage, PlanningPermit { name: stage_name.clone() });
        let actors = game.actors_on_stage(stage);
        for &actor in &actors {
            let name = game.entity_name(actor).to_string();
            attach(game, actor, PlanningPermit { name });
        }

        if narrate(game, stage).is_empty() {
            attach(game, stage, StagePermit { name: stage_name.clone() });
        }

        let player_actor = game.player.actor().to_string();
        let granted: Vec<String> = home
            .action_order
            .iter()
            .filter(|name| **name != player_actor)
            .filter(|name| {
                game.actor_entity(name)
                    .is_some_and(|e| actors.contains(&e))
            })
            .take(game.settings.actors_per_tick)
            .cloned()
            .collect();
        for name in &granted {
            if let Some(actor) = game.actor_entity(name) {
                attach(game, actor, ActorPermit { name: name.clone() });
            }
            home.action_order.retain(|n| n != name);
            home.action_order.push(name.clone());
        }
        tracing::debug!(stage = %stage_name, granted = ?granted, "Planning permits granted");
        attach(game, stage, home);
    }
}

pub struct HomePostProcessor;

#[async_trait]
impl Processor for HomePostProcessor {
    fn name(&self) -> &'static str {
        "home_post"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        remove_permits(game);
    }
}

// =============================================================================
// Actor plan
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ActorPlanResponse {
    #[serde(default)]
    speak_actions: BTreeMap<String, String>,
    #[serde(default)]
    whisper_actions: BTreeMap<String, String>,
    #[serde(default)]
    announce_actions: String,
    #[serde(default)]
    mind_voice_actions: String,
    #[serde(default)]
    enter_stage: String,
}

fn non_empty(map: BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.into_iter()
        .filter(|(target, content)| !target.trim().is_empty() && !content.trim().is_empty())
        .collect()
}

/// Asks actors holding an actor permit for their plan and turns it into actions.
pub struct HomeActorProcessor;

impl HomeActorProcessor {
    fn prompt(game: &TcgGame, actor: EntityId) -> Option<String> {
        let stage = game.stage_of(actor)?;
        let stage_name = game.entity_name(stage);
        let stages = game
            .store
            .get_group(&Matcher::new().all_of(&[ComponentKind::HomeComponent]))
            .into_iter()
            .filter(|&s| s != stage)
            .map(|s| format!("- {}", game.entity_name(s)))
            .collect::<Vec<_>>();
        let stages = if stages.is_empty() {
            "none".to_string()
        } else {
            stages.join("\n")
        };
        Some(prompt_templates::build(
            keys::ACTOR_PLAN,
            &[
                ("stage", stage_name),
                ("narrate", &narrate(game, stage)),
                ("actors", &actor_list(game, stage, Some(actor))),
                ("stages", &stages),
            ],
        ))
    }

    fn apply(game: &mut TcgGame, actor: EntityId, plan: ActorPlanResponse) {
        let name = game.entity_name(actor).to_string();
        let speak = non_empty(plan.speak_actions);
        if !speak.is_empty() {
            attach(game, actor, SpeakAction { name: name.clone(), data: speak });
        }
        let whisper = non_empty(plan.whisper_actions);
        if !whisper.is_empty() {
            attach(game, actor, WhisperAction { name: name.clone(), data: whisper });
        }
        if !plan.announce_actions.trim().is_empty() {
            attach(
                game,
                actor,
                AnnounceAction {
                    name: name.clone(),
                    data: plan.announce_actions,
                },
            );
        }
        if !plan.mind_voice_actions.trim().is_empty() {
            attach(
                game,
                actor,
                MindVoiceAction {
                    name: name.clone(),
                    data: plan.mind_voice_actions,
                },
            );
        }
        if !plan.enter_stage.trim().is_empty() {
            attach(
                game,
                actor,
                EnterStageAction {
                    name,
                    target: plan.enter_stage.trim().to_string(),
                },
            );
        }
    }
}

#[async_trait]
impl Processor for HomeActorProcessor {
    fn name(&self) -> &'static str {
        "home_actor"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::ActorPermit, ComponentKind::ActorComponent]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        let mut actors = Vec::with_capacity(entities.len());
        let mut requests = Vec::with_capacity(entities.len());
        for actor in entities {
            let Some(prompt) = Self::prompt(game, actor) else {
                continue;
            };
            let name = game.entity_name(actor).to_string();
            requests.push(ChatRequest::new(&name, prompt, history(game, &name)));
            actors.push((actor, name));
        }

        let responses = game.chat.gather(requests).await;
        for ((actor, name), response) in actors.into_iter().zip(responses) {
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(actor = %name, error = %e, "Actor plan request failed");
                    continue;
                }
            };
            game.memory
                .append_human(&name, prompt_templates::resolve(keys::ACTOR_PLAN_COMPRESSED));
            game.memory.append_ai(&name, response.output.clone());
            match parse_structured::<ActorPlanResponse>(&response.output) {
                Ok(plan) => Self::apply(game, actor, plan),
                Err(e) => {
                    game.memory.discard_last_human_ai_pair(&name);
                    tracing::warn!(actor = %name, error = %e, "Actor plan rejected");
                }
            }
        }
    }
}

// =============================================================================
// Action reactions
// =============================================================================

fn conversation_hint(speaker: &str, target: &str, check: ConversationCheck) -> GameEvent {
    let reason = match check {
        ConversationCheck::Valid => "no reason",
        ConversationCheck::InvalidTarget => "there is no such actor",
        ConversationCheck::NoStage => "the speaker is not on any stage",
        ConversationCheck::NotSameStage => "they are not on the same stage",
    };
    GameEvent::hint(format!(
        "# Notice! {speaker} cannot address {target}: {reason}."
    ))
}

pub struct MindVoiceProcessor;

#[async_trait]
impl Processor for MindVoiceProcessor {
    fn name(&self) -> &'static str {
        "mind_voice"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::MindVoiceAction]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        for entity in entities {
            let Some(action) = game.store.get::<MindVoiceAction>(entity).cloned() else {
                continue;
            };
            let event = GameEvent::MindVoiceEvent {
                message: format!("# Event! {} thinks: {}", action.name, action.data),
                actor: action.name,
                content: action.data,
            };
            game.notify_event(&[entity], &event);
        }
    }
}

/// Speech heard by everyone on the speaker's stage.
pub struct SpeakProcessor;

#[async_trait]
impl Processor for SpeakProcessor {
    fn name(&self) -> &'static str {
        "speak"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::SpeakAction]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        for entity in entities {
            let Some(action) = game.store.get::<SpeakAction>(entity).cloned() else {
                continue;
            };
            for (target, content) in action.data {
                match game.validate_conversation(entity, &target) {
                    ConversationCheck::Valid => {
                        let event = GameEvent::SpeakEvent {
                            message: format!("# Event! {} said to {target}: {content}", action.name),
                            speaker: action.name.clone(),
                            listener: target,
                            content,
                        };
                        game.broadcast_event(entity, &event, &[]);
                    }
                    check => {
                        let hint = conversation_hint(&action.name, &target, check);
                        game.notify_event(&[entity], &hint);
                    }
                }
            }
        }
    }
}

/// Speech only the speaker and the listener hear.
pub struct WhisperProcessor;

#[async_trait]
impl Processor for WhisperProcessor {
    fn name(&self) -> &'static str {
        "whisper"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::WhisperAction]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        for entity in entities {
            let Some(action) = game.store.get::<WhisperAction>(entity).cloned() else {
                continue;
            };
            for (target, content) in action.data {
                let check = game.validate_conversation(entity, &target);
                let listener = game.actor_entity(&target);
                match (check, listener) {
                    (ConversationCheck::Valid, Some(listener)) => {
                        let event = GameEvent::WhisperEvent {
                            message: format!(
                                "# Event! {} whispered to {target}: {content}",
                                action.name
                            ),
                            speaker: action.name.clone(),
                            listener: target,
                            content,
                        };
                        game.notify_event(&[entity, listener], &event);
                    }
                    (check, _) => {
                        let hint = conversation_hint(&action.name, &target, check);
                        game.notify_event(&[entity], &hint);
                    }
                }
            }
        }
    }
}

pub struct AnnounceProcessor;

#[async_trait]
impl Processor for AnnounceProcessor {
    fn name(&self) -> &'static str {
        "announce"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::AnnounceAction]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        for entity in entities {
            let Some(action) = game.store.get::<AnnounceAction>(entity).cloned() else {
                continue;
            };
            let Some(stage) = game.stage_of(entity) else {
                continue;
            };
            let stage = game.entity_name(stage).to_string();
            let event = GameEvent::AnnounceEvent {
                message: format!("# Event! {} announced on {stage}: {}", action.name, action.data),
                announcer: action.name,
                stage,
                content: action.data,
            };
            game.broadcast_event(entity, &event, &[]);
        }
    }
}

/// Walks an actor to another home stage.
pub struct StageTransitionProcessor;

#[async_trait]
impl Processor for StageTransitionProcessor {
    fn name(&self) -> &'static str {
        "stage_transition"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::EnterStageAction, ComponentKind::ActorComponent]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        for entity in entities {
            let Some(action) = game.store.get::<EnterStageAction>(entity).cloned() else {
                continue;
            };
            let destination = game
                .stage_entity(&action.target)
                .filter(|&s| game.store.has::<HomeComponent>(s));
            let Some(destination) = destination else {
                let hint = GameEvent::hint(format!(
                    "# Notice! {} cannot enter {}: it is not a stage you can walk to.",
                    action.name, action.target
                ));
                game.notify_event(&[entity], &hint);
                continue;
            };
            if let Err(e) = game.stage_transition(&[entity], destination) {
                tracing::warn!(actor = %action.name, error = %e, "Stage transition failed");
            }
        }
    }
}
