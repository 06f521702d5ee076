//! Round adjudication: the stage director rules on the played cards, each
//! actor reports its new state, and the round is closed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dungeonforge_domain::components::{
    CombatRoleComponent, DirectorAction, FeedbackAction, PlayCardAction, TurnAction,
};
use dungeonforge_domain::rpg::format_status_effects;
use dungeonforge_domain::{
    settle_status_effects, ComponentKind, EntityId, GameEvent, StatusEffect,
};
use dungeonforge_shared::ChatRequest;
use serde::Deserialize;

use super::{attach, history};
use crate::chat::parse_structured;
use crate::ecs::{GroupEvent, Matcher};
use crate::game::TcgGame;
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

/// Actors on `stage` holding a turn, ordered by turn.
fn turn_takers(game: &TcgGame, stage: EntityId) -> Vec<(EntityId, TurnAction)> {
    let mut turns: Vec<(EntityId, TurnAction)> = game
        .actors_on_stage(stage)
        .into_iter()
        .filter_map(|e| game.store.get::<TurnAction>(e).cloned().map(|t| (e, t)))
        .collect();
    turns.sort_by_key(|(_, turn)| turn.turn);
    turns
}

fn stats_line(role: &CombatRoleComponent) -> String {
    format!(
        "{}\nStatus effects: {}",
        role.profile.stats_prompt(),
        format_status_effects(&role.status_effects)
    )
}

// =============================================================================
// Director
// =============================================================================

#[derive(Debug, Deserialize)]
struct DirectorResponse {
    calculation: String,
    performance: String,
}

/// Rules on a round once every turn taker on the stage has played a card.
pub struct DirectorProcessor;

impl DirectorProcessor {
    /// `None` while some turn taker has not played yet.
    fn prompt(game: &TcgGame, stage: EntityId) -> Option<String> {
        let turns = turn_takers(game, stage);
        if turns.is_empty() {
            return None;
        }
        let mut sequence = Vec::with_capacity(turns.len());
        let mut details = Vec::with_capacity(turns.len());
        for (actor, turn) in &turns {
            let card = game.store.get::<PlayCardAction>(*actor)?;
            sequence.push(format!(
                "{}. {} uses {} on {}",
                turn.turn + 1,
                card.name,
                card.skill.name,
                card.targets.join(", ")
            ));
            let stats = game
                .combat_role(*actor)
                .map(stats_line)
                .unwrap_or_else(|| "unknown".to_string());
            details.push(format!(
                "### {}\n{stats}\nSkill: {} - {} ({})\nTargets: {}\nReason: {}\nSays: {}",
                card.name,
                card.skill.name,
                card.skill.description,
                card.skill.effect,
                card.targets.join(", "),
                card.reason,
                card.dialogue
            ));
        }
        Some(prompt_templates::build(
            keys::DIRECTOR,
            &[
                ("sequence", &sequence.join("\n")),
                ("details", &details.join("\n")),
                ("mechanics", &prompt_templates::resolve(keys::COMBAT_MECHANICS)),
            ],
        ))
    }
}

#[async_trait]
impl Processor for DirectorProcessor {
    fn name(&self) -> &'static str {
        "director"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::DirectorAction, ComponentKind::StageComponent]),
            GroupEvent::Added,
        ))
    }

    fn filter(&self, game: &TcgGame, entity: EntityId) -> bool {
        game.store
            .get::<DirectorAction>(entity)
            .is_some_and(|action| !action.is_resolved())
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        for stage in entities {
            let name = game.entity_name(stage).to_string();
            let Some(prompt) = Self::prompt(game, stage) else {
                tracing::debug!(stage = %name, "Waiting for every card to be played");
                continue;
            };
            let request = ChatRequest::new(&name, prompt, history(game, &name));
            let parsed = game
                .chat
                .request(request)
                .await
                .and_then(|r| parse_structured::<DirectorResponse>(&r.output));
            let ruling = match parsed {
                Ok(r) if !r.calculation.trim().is_empty() && !r.performance.trim().is_empty() => r,
                Ok(_) => {
                    tracing::warn!(stage = %name, "Director ruling was incomplete");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(stage = %name, error = %e, "Director request failed");
                    continue;
                }
            };

            attach(
                game,
                stage,
                DirectorAction {
                    name: name.clone(),
                    calculation: ruling.calculation,
                    performance: ruling.performance,
                },
            );
            for (actor, turn) in turn_takers(game, stage) {
                attach(game, actor, FeedbackAction::pending(turn.name));
            }
            tracing::info!(stage = %name, "Round ruled");
        }
    }
}

// =============================================================================
// Feedback
// =============================================================================

#[derive(Debug, Deserialize)]
struct FeedbackResponse {
    #[serde(default)]
    description: String,
    update_hp: i64,
    #[serde(default)]
    update_max_hp: Option<i64>,
    #[serde(default)]
    effects: Vec<StatusEffect>,
}

/// Each actor reads the ruling and reports its hp and status effects.
pub struct FeedbackProcessor;

impl FeedbackProcessor {
    fn prompt(game: &TcgGame, actor: EntityId) -> Option<String> {
        let stage = game.stage_of(actor)?;
        let ruling = game
            .store
            .get::<DirectorAction>(stage)
            .filter(|d| d.is_resolved())?;
        let role = game.combat_role(actor)?;
        Some(prompt_templates::build(
            keys::FEEDBACK,
            &[
                ("calculation", &ruling.calculation),
                ("performance", &ruling.performance),
                ("stats", &role.profile.stats_prompt()),
                ("effects", &format_status_effects(&role.status_effects)),
            ],
        ))
    }
}

#[async_trait]
impl Processor for FeedbackProcessor {
    fn name(&self) -> &'static str {
        "feedback"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::FeedbackAction]),
            GroupEvent::Added,
        ))
    }

    fn filter(&self, game: &TcgGame, entity: EntityId) -> bool {
        game.combat_role(entity).is_some()
            && game
                .store
                .get::<FeedbackAction>(entity)
                .is_some_and(|action| !action.is_resolved())
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
            let parsed = response.and_then(|r| parse_structured::<FeedbackResponse>(&r.output));
            match parsed {
                Ok(feedback) => attach(
                    game,
                    actor,
                    FeedbackAction {
                        name,
                        description: feedback.description,
                        update_hp: Some(feedback.update_hp),
                        update_max_hp: feedback.update_max_hp,
                        effects: feedback.effects,
                    },
                ),
                Err(e) => tracing::warn!(actor = %name, error = %e, "Feedback rejected"),
            }
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Applies a fully ruled round: notices, the performance broadcast, hp and
/// status effect updates, and the round record.
pub struct CombatResolutionProcessor;

struct Resolved {
    actor: EntityId,
    card: PlayCardAction,
    feedback: FeedbackAction,
}

impl CombatResolutionProcessor {
    fn ready(game: &TcgGame) -> Option<(EntityId, DirectorAction, Vec<Resolved>)> {
        if !game.world.dungeon.engagement.is_ongoing_phase() {
            return None;
        }
        let stage = game.player_stage()?;
        let ruling = game
            .store
            .get::<DirectorAction>(stage)
            .filter(|d| d.is_resolved())?
            .clone();
        let turns = turn_takers(game, stage);
        if turns.is_empty() {
            return None;
        }
        let mut resolved = Vec::with_capacity(turns.len());
        for (actor, _) in turns {
            let card = game.store.get::<PlayCardAction>(actor)?.clone();
            let feedback = game
                .store
                .get::<FeedbackAction>(actor)
                .filter(|f| f.is_resolved())?
                .clone();
            resolved.push(Resolved {
                actor,
                card,
                feedback,
            });
        }
        Some((stage, ruling, resolved))
    }
}

#[async_trait]
impl Processor for CombatResolutionProcessor {
    fn name(&self) -> &'static str {
        "combat_resolution"
    }

    fn execute(&mut self, game: &mut TcgGame) {
        let Some((stage, ruling, resolved)) = Self::ready(game) else {
            return;
        };
        let round_number = game.world.dungeon.engagement.rounds().len();
        let stage_name = game.entity_name(stage).to_string();

        let mut select_report = BTreeMap::new();
        for r in &resolved {
            game.memory.append_human(
                &r.card.name,
                format!("# Notice! Combat round {round_number} begins!"),
            );
            let select = format!(
                "# You used {} on {}.\nReason: {}\nYou said: {}",
                r.card.skill.name,
                r.card.targets.join(", "),
                r.card.reason,
                r.card.dialogue
            );
            game.memory.append_human(&r.card.name, select.clone());
            select_report.insert(r.card.name.clone(), select);
        }

        let performance = GameEvent::CombatPerformanceEvent {
            message: format!("# Event! Combat round:\n{}", ruling.performance),
            stage: stage_name.clone(),
            performance: ruling.performance.clone(),
        };
        game.broadcast_event(stage, &performance, &[]);

        let mut feedback_report = BTreeMap::new();
        for r in resolved {
            let Some(mut role) = game.combat_role(r.actor).cloned() else {
                continue;
            };
            if let Some(max_hp) = r.feedback.update_max_hp {
                role.profile.set_max_hp(max_hp);
            }
            let hp = r.feedback.update_hp.unwrap_or(role.profile.hp());
            let change = role.profile.set_hp(hp);
            let settlement = settle_status_effects(r.feedback.effects);
            role.status_effects = settlement.remaining;

            let mut status = format!(
                "# Notice! Your status after round {round_number}: {}\nHP {} -> {}/{}\nStatus effects: {}",
                r.feedback.description,
                change.previous,
                change.current,
                change.max_hp,
                format_status_effects(&role.status_effects)
            );
            if !settlement.expired.is_empty() {
                let expired: Vec<&str> =
                    settlement.expired.iter().map(|e| e.name.as_str()).collect();
                status.push_str(&format!("\nExpired: {}", expired.join(", ")));
            }
            tracing::debug!(
                actor = %role.name,
                hp = change.current,
                delta = change.delta(),
                "Round applied"
            );
            let name = role.name.clone();
            attach(game, r.actor, role);
            game.memory.append_human(&name, status.clone());
            feedback_report.insert(name, status);
        }

        match game.world.dungeon.engagement.last_round_mut() {
            Some(round) => {
                round.select_report = select_report;
                round.stage_director_calculation = ruling.calculation;
                round.stage_director_performance = ruling.performance;
                round.feedback_report = feedback_report;
                tracing::info!(round = %round.tag, stage = %stage_name, "Round closed");
            }
            None => tracing::warn!(stage = %stage_name, "No round to record the ruling in"),
        }
    }
}
