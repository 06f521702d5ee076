//! Processors and the two pipelines built from them.
//!
//! - `common` - tick markers, kickoff, action cleanup, destruction, save
//! - `home` - planning permits, actor plans and the home action reactions
//! - `stage` - scene narration for home and dungeon stages
//! - `combat_kickoff`, `cards`, `round`, `outcome` - the combat round

mod cards;
mod combat_kickoff;
mod common;
mod home;
mod outcome;
mod round;
mod stage;

use std::sync::Arc;

use dungeonforge_domain::components::EnvironmentComponent;
use dungeonforge_domain::{ChatMessage, ComponentType, EntityId};

use crate::game::TcgGame;
use crate::infrastructure::ports::{ClockPort, WorldRepo};
use crate::pipeline::Pipeline;

pub use cards::{DrawCardsProcessor, PlayCardProcessor};
pub use combat_kickoff::CombatKickOffProcessor;
pub use common::{
    BeginProcessor, DestroyEntityProcessor, EndProcessor, KickOffProcessor, PostActionProcessor,
    PreActionProcessor, SaveProcessor,
};
pub use home::{
    AnnounceProcessor, HomeActorProcessor, HomePostProcessor, HomePreProcessor,
    MindVoiceProcessor, SpeakProcessor, StageTransitionProcessor, WhisperProcessor,
};
pub use outcome::{CombatCompleteProcessor, CombatDeathProcessor, CombatResultProcessor};
pub use round::{CombatResolutionProcessor, DirectorProcessor, FeedbackProcessor};
pub use stage::{DungeonStageProcessor, HomeStageProcessor};

/// Memory tags delimiting one combat in a hero's log.
pub mod tags {
    /// On the kickoff prompt; value is the stage name.
    pub const COMBAT_KICKOFF: &str = "combat_kickoff_tag";
    /// On the result notice; value is the stage name.
    pub const COMBAT_RESULT: &str = "combat_result_tag";
}

pub fn create_home_pipeline(repo: Arc<dyn WorldRepo>, clock: Arc<dyn ClockPort>) -> Pipeline {
    Pipeline::new("home")
        .add(KickOffProcessor)
        .add(BeginProcessor::default())
        .add(HomePreProcessor)
        .add(HomeStageProcessor)
        .add(HomeActorProcessor)
        .add(PreActionProcessor)
        .add(MindVoiceProcessor)
        .add(SpeakProcessor)
        .add(WhisperProcessor)
        .add(AnnounceProcessor)
        .add(StageTransitionProcessor)
        .add(PostActionProcessor)
        .add(HomePostProcessor)
        .add(DestroyEntityProcessor)
        .add(EndProcessor)
        .add(SaveProcessor::new(repo, clock))
}

pub fn create_dungeon_pipeline(repo: Arc<dyn WorldRepo>, clock: Arc<dyn ClockPort>) -> Pipeline {
    Pipeline::new("dungeon")
        .add(KickOffProcessor)
        .add(DungeonStageProcessor)
        .add(CombatKickOffProcessor)
        .add(BeginProcessor::default())
        .add(PreActionProcessor)
        .add(DrawCardsProcessor)
        .add(PlayCardProcessor)
        .add(DirectorProcessor)
        .add(FeedbackProcessor)
        .add(CombatResolutionProcessor)
        .add(PostActionProcessor)
        .add(CombatDeathProcessor)
        .add(CombatResultProcessor)
        .add(DestroyEntityProcessor)
        .add(EndProcessor)
        .add(CombatCompleteProcessor)
        .add(SaveProcessor::new(repo, clock))
}

// =============================================================================
// Prompt helpers
// =============================================================================

fn history(game: &TcgGame, name: &str) -> Vec<ChatMessage> {
    game.memory.history(name).to_vec()
}

/// `- name: appearance` per actor on `stage`, minus `exclude`.
fn actor_list(game: &TcgGame, stage: EntityId, exclude: Option<EntityId>) -> String {
    let mapping = game.appearance_mapping(stage, exclude);
    if mapping.is_empty() {
        return "none".to_string();
    }
    mapping
        .iter()
        .map(|(name, appearance)| format!("- {name}: {appearance}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage narration, empty until the stage has been described.
fn narrate(game: &TcgGame, stage: EntityId) -> String {
    game.store
        .get::<EnvironmentComponent>(stage)
        .map(|env| env.narrate.clone())
        .unwrap_or_default()
}

/// Attach a component, logging instead of failing when the entity is gone.
fn attach<T: ComponentType>(game: &mut TcgGame, entity: EntityId, value: T) {
    if let Err(e) = game.store.replace(entity, value) {
        tracing::warn!(component = %T::KIND, error = %e, "Could not attach component");
    }
}
