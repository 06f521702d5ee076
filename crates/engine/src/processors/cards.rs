//! Hands and turns: drawing skill cards and choosing one per turn.

use async_trait::async_trait;
use dungeonforge_domain::components::{
    DeathComponent, DirectorAction, DrawCardsAction, HandComponent, PlayCardAction, TurnAction,
    XCardPlayerComponent,
};
use dungeonforge_domain::rpg::format_status_effects;
use dungeonforge_domain::{ComponentKind, EntityId, HandDetail, Skill};
use dungeonforge_shared::ChatRequest;
use serde::Deserialize;
use thiserror::Error;

use super::{actor_list, attach, history, narrate};
use crate::chat::parse_structured;
use crate::ecs::{GroupEvent, Matcher};
use crate::game::TcgGame;
use crate::infrastructure::ports::ChatError;
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

// =============================================================================
// Draw
// =============================================================================

#[derive(Debug, Deserialize)]
struct DrawnSkill {
    skill: Skill,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    dialogue: String,
}

#[derive(Debug, Deserialize)]
struct DrawCardsResponse {
    skills: Vec<DrawnSkill>,
}

/// Output example quoted in the draw prompt, one entry per requested card.
fn draw_example(count: usize) -> String {
    let skill = serde_json::json!({
        "skill": {
            "name": "Skill name",
            "description": "What the skill does, with amounts",
            "effect": "Mechanical effect, with amounts"
        },
        "targets": ["Target full name"],
        "reason": "Why you would use it",
        "dialogue": "What you say as you use it"
    });
    serde_json::json!({ "skills": vec![skill; count.max(1)] }).to_string()
}

fn hand_from(name: &str, skills: Vec<DrawnSkill>) -> HandComponent {
    let mut hand = HandComponent {
        name: name.to_string(),
        skills: Vec::with_capacity(skills.len()),
        details: Vec::with_capacity(skills.len()),
    };
    for drawn in skills {
        hand.details.push(HandDetail {
            skill: drawn.skill.name.clone(),
            targets: drawn.targets,
            reason: drawn.reason,
            dialogue: drawn.dialogue,
        });
        hand.skills.push(drawn.skill);
    }
    hand
}

/// Replaces the hand of every living combatant holding a draw action.
///
/// A pending x-card replaces the drawn hand once and skips the model call.
pub struct DrawCardsProcessor;

impl DrawCardsProcessor {
    fn prompt(game: &TcgGame, actor: EntityId) -> Option<String> {
        let stage = game.stage_of(actor)?;
        let round_turns = game
            .world
            .dungeon
            .engagement
            .last_round()
            .map(|round| round.round_turns.join(" -> "))
            .unwrap_or_else(|| "not decided yet".to_string());
        let count = game.settings.skill_draw_count;
        Some(prompt_templates::build(
            keys::DRAW_CARDS,
            &[
                ("count", &count.to_string()),
                ("stage", game.entity_name(stage)),
                ("narrate", &narrate(game, stage)),
                ("round_turns", &round_turns),
                ("example", &draw_example(count)),
            ],
        ))
    }
}

#[async_trait]
impl Processor for DrawCardsProcessor {
    fn name(&self) -> &'static str {
        "draw_cards"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::DrawCardsAction]),
            GroupEvent::Added,
        ))
    }

    fn filter(&self, game: &TcgGame, entity: EntityId) -> bool {
        game.combat_role(entity).is_some() && !game.store.has::<DeathComponent>(entity)
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        if !game.world.dungeon.engagement.is_ongoing_phase() {
            tracing::warn!(
                phase = %game.world.dungeon.engagement.phase(),
                "Cards can only be drawn during an ongoing combat"
            );
            return;
        }
        for participant in game.combat_participants() {
            game.store.remove::<HandComponent>(participant);
        }

        let mut actors = Vec::new();
        let mut requests = Vec::new();
        for actor in entities {
            let name = game.entity_name(actor).to_string();
            if let Some(xcard) = game.store.remove::<XCardPlayerComponent>(actor) {
                let hand = HandComponent {
                    name: name.clone(),
                    skills: vec![xcard.skill.clone()],
                    details: vec![HandDetail {
                        skill: xcard.skill.name,
                        targets: Vec::new(),
                        reason: String::new(),
                        dialogue: String::new(),
                    }],
                };
                attach(game, actor, hand);
                tracing::debug!(actor = %name, "X-card replaced the hand");
                continue;
            }
            let Some(prompt) = Self::prompt(game, actor) else {
                continue;
            };
            requests.push(ChatRequest::new(&name, prompt, history(game, &name)));
            actors.push((actor, name));
        }

        let responses = game.chat.gather(requests).await;
        for ((actor, name), response) in actors.into_iter().zip(responses) {
            let parsed = response.and_then(|r| parse_structured::<DrawCardsResponse>(&r.output));
            match parsed {
                Ok(drawn) if !drawn.skills.is_empty() => {
                    let hand = hand_from(&name, drawn.skills);
                    tracing::debug!(actor = %name, cards = hand.skills.len(), "Hand drawn");
                    attach(game, actor, hand);
                }
                Ok(_) => tracing::warn!(actor = %name, "Drew an empty hand"),
                Err(e) => tracing::warn!(actor = %name, error = %e, "Draw cards failed"),
            }
        }
    }
}

// =============================================================================
// Play
// =============================================================================

#[derive(Debug, Deserialize)]
struct PlayCardResponse {
    skill: String,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    dialogue: String,
}

#[derive(Debug, Error)]
enum SelectionError {
    #[error(transparent)]
    Parse(#[from] ChatError),
    #[error("skill {0} is not in hand")]
    UnknownSkill(String),
    #[error("no targets given")]
    NoTargets,
    #[error("target {0} is not on the stage")]
    InvalidTarget(String),
}

fn hand_prompt(hand: &HandComponent) -> String {
    hand.skills
        .iter()
        .map(|skill| format!("- {}: {} ({})", skill.name, skill.description, skill.effect))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asks each actor whose turn came up to pick a card and targets.
pub struct PlayCardProcessor;

impl PlayCardProcessor {
    fn prompt(game: &TcgGame, actor: EntityId, turn: &TurnAction) -> Option<String> {
        let stage = game.stage_of(actor)?;
        let hand = game.store.get::<HandComponent>(actor)?;
        let role = game.combat_role(actor)?;
        let stats = format!(
            "{}\nStatus effects: {}",
            role.profile.stats_prompt(),
            format_status_effects(&role.status_effects)
        );
        Some(prompt_templates::build(
            keys::PLAY_CARD,
            &[
                ("round", &turn.round.to_string()),
                ("turn", &(turn.turn + 1).to_string()),
                ("round_turns", &turn.round_turns.join(" -> ")),
                ("hand", &hand_prompt(hand)),
                ("actors", &actor_list(game, stage, Some(actor))),
                ("stats", &stats),
            ],
        ))
    }

    fn select(game: &TcgGame, actor: EntityId, output: &str) -> Result<PlayCardAction, SelectionError> {
        let reply = parse_structured::<PlayCardResponse>(output)?;
        let skill = game
            .store
            .get::<HandComponent>(actor)
            .and_then(|hand| hand.find_skill(&reply.skill))
            .cloned()
            .ok_or_else(|| SelectionError::UnknownSkill(reply.skill.clone()))?;
        if reply.targets.is_empty() {
            return Err(SelectionError::NoTargets);
        }
        let stage = game.stage_of(actor);
        for target in &reply.targets {
            let on_stage = game
                .actor_entity(target)
                .is_some_and(|t| stage.is_some() && game.stage_of(t) == stage);
            if !on_stage {
                return Err(SelectionError::InvalidTarget(target.clone()));
            }
        }
        Ok(PlayCardAction {
            name: game.entity_name(actor).to_string(),
            skill,
            targets: reply.targets,
            reason: reply.reason,
            dialogue: reply.dialogue,
        })
    }
}

#[async_trait]
impl Processor for PlayCardProcessor {
    fn name(&self) -> &'static str {
        "play_card"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::TurnAction]),
            GroupEvent::Added,
        ))
    }

    fn filter(&self, game: &TcgGame, entity: EntityId) -> bool {
        game.store.has::<HandComponent>(entity) && !game.store.has::<DeathComponent>(entity)
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        let mut turns: Vec<(EntityId, TurnAction)> = entities
            .into_iter()
            .filter_map(|e| game.store.get::<TurnAction>(e).cloned().map(|t| (e, t)))
            .collect();
        turns.sort_by_key(|(_, turn)| turn.turn);

        let mut actors = Vec::with_capacity(turns.len());
        let mut requests = Vec::with_capacity(turns.len());
        for (actor, turn) in &turns {
            let Some(prompt) = Self::prompt(game, *actor, turn) else {
                continue;
            };
            requests.push(ChatRequest::new(&turn.name, prompt.clone(), history(game, &turn.name)));
            actors.push((*actor, turn.name.clone(), prompt));
        }

        let responses = game.chat.gather(requests).await;
        for ((actor, name, prompt), response) in actors.into_iter().zip(responses) {
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(actor = %name, error = %e, "Play card request failed");
                    continue;
                }
            };
            game.memory.append_human(&name, prompt);
            game.memory.append_ai(&name, response.output.clone());

            match Self::select(game, actor, &response.output) {
                Ok(action) => {
                    tracing::debug!(actor = %name, skill = %action.skill.name, targets = ?action.targets, "Card played");
                    attach(game, actor, action);
                    if let Some(stage) = game.stage_of(actor) {
                        let stage_name = game.entity_name(stage).to_string();
                        if !game.store.has::<DirectorAction>(stage) {
                            attach(game, stage, DirectorAction::pending(stage_name));
                        }
                    }
                }
                Err(e) => {
                    game.memory.discard_last_human_ai_pair(&name);
                    tracing::warn!(actor = %name, error = %e, "Card selection rejected");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::worlds;

    fn draw_reply(skill: &str) -> String {
        serde_json::json!({
            "skills": [{
                "skill": {"name": skill, "description": "A strike", "effect": "2 damage"},
                "targets": [worlds::MONSTER],
                "reason": "It is close",
                "dialogue": "Take this!"
            }]
        })
        .to_string()
    }

    #[test]
    fn draw_example_lists_one_entry_per_card() {
        let value: serde_json::Value =
            serde_json::from_str(&draw_example(3)).expect("example is JSON");
        assert_eq!(value["skills"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["skills"][0]["skill"]["name"], "Skill name");
    }

    #[tokio::test]
    async fn drawing_installs_hands_without_touching_memory() {
        let mut game = worlds::ongoing_combat_game(vec![
            (worlds::HERO, draw_reply("Slash")),
            (worlds::COMPANION, draw_reply("Shield Bash")),
            (worlds::MONSTER, draw_reply("Bite")),
        ]);
        let before = game.memory.len(worlds::HERO);
        let participants = game.combat_participants();

        DrawCardsProcessor.react(&mut game, participants).await;

        let hero = game.actor_entity(worlds::HERO).expect("hero");
        let hand = game.store.get::<HandComponent>(hero).expect("hand");
        assert_eq!(hand.skills[0].name, "Slash");
        assert_eq!(hand.details[0].targets, vec![worlds::MONSTER.to_string()]);
        assert_eq!(game.memory.len(worlds::HERO), before);
    }

    #[tokio::test]
    async fn xcard_replaces_the_hand_once() {
        let mut game = worlds::ongoing_combat_game(vec![
            (worlds::COMPANION, draw_reply("Shield Bash")),
            (worlds::MONSTER, draw_reply("Bite")),
        ]);
        game.activate_xcard(Skill {
            name: "Meteor".into(),
            description: "Fire from the sky".into(),
            effect: "20 damage".into(),
        })
        .expect("xcard");
        let participants = game.combat_participants();

        DrawCardsProcessor.react(&mut game, participants).await;

        let hero = game.actor_entity(worlds::HERO).expect("hero");
        let hand = game.store.get::<HandComponent>(hero).expect("hand");
        assert_eq!(hand.skills.len(), 1);
        assert_eq!(hand.skills[0].name, "Meteor");
        assert!(!game.store.has::<XCardPlayerComponent>(hero));
    }

    #[tokio::test]
    async fn failed_draw_leaves_no_stale_hand() {
        let mut game = worlds::ongoing_combat_game(Vec::new());
        worlds::give_hands(&mut game);
        let monster = game.actor_entity(worlds::MONSTER).expect("monster");

        DrawCardsProcessor.react(&mut game, vec![monster]).await;

        assert!(!game.store.has::<HandComponent>(monster));
    }

    #[tokio::test]
    async fn valid_selection_attaches_the_card_and_a_director_slot() {
        let mut game = worlds::ongoing_combat_game(vec![(
            worlds::HERO,
            r#"{"skill":"Slash","targets":["Goblin"],"reason":"Closest","dialogue":"Hah!"}"#
                .to_string(),
        )]);
        worlds::give_hands(&mut game);
        game.create_combat_round().expect("round");
        game.activate_play_cards().expect("turns");
        let hero = game.actor_entity(worlds::HERO).expect("hero");
        let before = game.memory.len(worlds::HERO);

        PlayCardProcessor.react(&mut game, vec![hero]).await;

        let action = game.store.get::<PlayCardAction>(hero).expect("card");
        assert_eq!(action.skill.name, "Slash");
        let cave = game.stage_entity(worlds::CAVE).expect("cave");
        assert!(game.store.get::<DirectorAction>(cave).is_some_and(|d| !d.is_resolved()));
        assert_eq!(game.memory.len(worlds::HERO), before + 2);
    }

    #[tokio::test]
    async fn invalid_selection_is_rolled_back() {
        let mut game = worlds::ongoing_combat_game(vec![
            (
                worlds::HERO,
                r#"{"skill":"Fireball","targets":["Goblin"],"reason":"","dialogue":""}"#.to_string(),
            ),
            (
                worlds::COMPANION,
                r#"{"skill":"Slash","targets":["Dragon"],"reason":"","dialogue":""}"#.to_string(),
            ),
        ]);
        worlds::give_hands(&mut game);
        game.create_combat_round().expect("round");
        game.activate_play_cards().expect("turns");
        let hero = game.actor_entity(worlds::HERO).expect("hero");
        let companion = game.actor_entity(worlds::COMPANION).expect("companion");
        let hero_before = game.memory.len(worlds::HERO);
        let companion_before = game.memory.len(worlds::COMPANION);

        PlayCardProcessor.react(&mut game, vec![hero, companion]).await;

        assert!(!game.store.has::<PlayCardAction>(hero));
        assert!(!game.store.has::<PlayCardAction>(companion));
        assert_eq!(game.memory.len(worlds::HERO), hero_before);
        assert_eq!(game.memory.len(worlds::COMPANION), companion_before);
        let cave = game.stage_entity(worlds::CAVE).expect("cave");
        assert!(!game.store.has::<DirectorAction>(cave));
    }
}
