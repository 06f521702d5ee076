//! Game session: one game and the two pipelines that drive it.
//!
//! Every tick runs exactly one pipeline, picked from the player's stage. Both
//! pipelines register collectors on the same store, so after a tick the idle
//! pipeline's queues are dropped; otherwise it would react to stale changes
//! the next time the player crosses over.

use std::sync::Arc;

use dungeonforge_domain::WorldRuntime;

use crate::game::{GameState, TcgGame};
use crate::infrastructure::ports::{ClockPort, PersistenceError, WorldRepo};
use crate::pipeline::Pipeline;
use crate::processors::{create_dungeon_pipeline, create_home_pipeline};

pub struct GameSession {
    pub game: TcgGame,
    home: Pipeline,
    dungeon: Pipeline,
    ticks: u64,
}

impl GameSession {
    pub fn new(game: TcgGame, repo: Arc<dyn WorldRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            game,
            home: create_home_pipeline(repo.clone(), clock.clone()),
            dungeon: create_dungeon_pipeline(repo, clock),
            ticks: 0,
        }
    }

    /// Register both pipelines' collectors. Safe to call more than once.
    pub fn initialize(&mut self) {
        self.home.initialize(&mut self.game);
        self.dungeon.initialize(&mut self.game);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        !self.game.exit_requested()
    }

    /// Run one tick of the pipeline matching the player's location.
    pub async fn tick(&mut self) -> GameState {
        self.initialize();
        let state = self.game.game_state();
        let (active, idle) = match state {
            GameState::Home => (&mut self.home, &mut self.dungeon),
            GameState::Dungeon => (&mut self.dungeon, &mut self.home),
            GameState::None => {
                tracing::warn!(world = %self.game.name(), "Player is on no stage, tick skipped");
                return state;
            }
        };

        self.ticks += 1;
        tracing::debug!(tick = self.ticks, pipeline = active.name(), "Tick");
        active.execute(&mut self.game).await;
        idle.clear_reactive_queues(&mut self.game);
        state
    }

    /// Run every teardown hook once, home first.
    pub fn tear_down(&mut self) {
        self.home.tear_down(&mut self.game);
        self.dungeon.tear_down(&mut self.game);
        tracing::info!(world = %self.game.name(), ticks = self.ticks, "Session closed");
    }
}

/// The saved runtime document of `world_name`, or a fresh one from
/// `fallback` when nothing was saved yet.
pub async fn load_world(
    repo: &dyn WorldRepo,
    world_name: &str,
    fallback: impl FnOnce() -> Option<WorldRuntime>,
) -> Result<WorldRuntime, PersistenceError> {
    if let Some(world) = repo.load_world(world_name).await? {
        tracing::info!(world = %world_name, "Resuming saved world");
        return Ok(world);
    }
    let world = fallback().ok_or_else(|| PersistenceError::MissingWorld(world_name.to_string()))?;
    tracing::info!(world = %world_name, "Starting world from boot data");
    Ok(world)
}
