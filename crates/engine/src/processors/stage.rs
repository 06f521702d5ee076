//! Scene narration for home stages (on a stage permit) and dungeon levels
//! (before the fight and between rounds).

use async_trait::async_trait;
use dungeonforge_domain::components::EnvironmentComponent;
use dungeonforge_domain::{ComponentKind, EntityId};
use dungeonforge_shared::ChatRequest;
use serde::Deserialize;

use super::{actor_list, attach, history};
use crate::chat::parse_structured;
use crate::ecs::{GroupEvent, Matcher};
use crate::game::{GameState, TcgGame};
use crate::pipeline::Processor;
use crate::prompt_templates::{self, keys};

#[derive(Debug, Deserialize)]
struct StagePlanResponse {
    environment_narration: String,
}

/// Ask each stage to describe itself and store the narration.
///
/// Memory receives the compressed prompt and the raw reply, and only when
/// the reply validates.
async fn narrate_stages(game: &mut TcgGame, stages: Vec<EntityId>) {
    let mut names = Vec::with_capacity(stages.len());
    let mut requests = Vec::with_capacity(stages.len());
    for stage in stages {
        let name = game.entity_name(stage).to_string();
        let prompt = prompt_templates::build(
            keys::STAGE_PLAN,
            &[("actors", &actor_list(game, stage, None))],
        );
        requests.push(ChatRequest::new(&name, prompt, history(game, &name)));
        names.push((stage, name));
    }

    let responses = game.chat.gather(requests).await;
    for ((stage, name), response) in names.into_iter().zip(responses) {
        let parsed = response.and_then(|r| {
            parse_structured::<StagePlanResponse>(&r.output).map(|plan| (r.output, plan))
        });
        let (output, plan) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(stage = %name, error = %e, "Stage narration failed");
                continue;
            }
        };
        if plan.environment_narration.trim().is_empty() {
            tracing::warn!(stage = %name, "Stage narration was empty");
            continue;
        }
        game.memory
            .append_human(&name, prompt_templates::resolve(keys::STAGE_PLAN_COMPRESSED));
        game.memory.append_ai(&name, output);
        attach(
            game,
            stage,
            EnvironmentComponent {
                name: name.clone(),
                narrate: plan.environment_narration,
            },
        );
        tracing::debug!(stage = %name, "Stage narrated");
    }
}

/// Narrates home stages holding a fresh stage permit.
pub struct HomeStageProcessor;

#[async_trait]
impl Processor for HomeStageProcessor {
    fn name(&self) -> &'static str {
        "home_stage"
    }

    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        Some((
            Matcher::new().all_of(&[ComponentKind::StagePermit, ComponentKind::HomeComponent]),
            GroupEvent::Added,
        ))
    }

    async fn react(&mut self, game: &mut TcgGame, entities: Vec<EntityId>) {
        narrate_stages(game, entities).await;
    }
}

/// Narrates the player's dungeon level while the combat is being set up
/// and when a new round opens without any pending card actions.
pub struct DungeonStageProcessor;

impl DungeonStageProcessor {
    fn should_narrate(game: &TcgGame) -> bool {
        if game.game_state() != GameState::Dungeon {
            return false;
        }
        let engagement = &game.world.dungeon.engagement;
        if engagement.is_kickoff_phase() {
            return true;
        }
        engagement.is_ongoing_phase()
            && game
                .store
                .get_group(
                    &Matcher::new()
                        .any_of(&[ComponentKind::DrawCardsAction, ComponentKind::TurnAction]),
                )
                .is_empty()
    }
}

#[async_trait]
impl Processor for DungeonStageProcessor {
    fn name(&self) -> &'static str {
        "dungeon_stage"
    }

    async fn a_execute1(&mut self, game: &mut TcgGame) {
        if !Self::should_narrate(game) {
            return;
        }
        if let Some(stage) = game.player_stage() {
            narrate_stages(game, vec![stage]).await;
        }
    }
}
