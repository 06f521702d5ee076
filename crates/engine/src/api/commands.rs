//! Player command handling.
//!
//! Each command is checked against the game mode and combat phase, turned
//! into activations on the game and, where the model has work to do,
//! followed by one tick. The response carries the notifications produced
//! along the way.

use dungeonforge_domain::{DomainError, Skill};
use dungeonforge_shared::{CommandError, ErrorCode, PlayerCommand, ResponseResult};

use crate::game::GameState;
use crate::session::GameSession;

#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl HandlerError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Command(e) => e.code(),
            Self::Domain(DomainError::NotFound { .. }) => ErrorCode::InvalidTarget,
            Self::Domain(DomainError::InvalidStateTransition(_)) => ErrorCode::WrongPhase,
            Self::Domain(DomainError::Validation(_)) => ErrorCode::BadRequest,
            Self::Domain(DomainError::Parse(_)) => ErrorCode::InternalError,
        }
    }
}

/// Whether the command needs a tick after its activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Follow {
    Tick,
    Done,
}

/// Parse and run one line of player input.
pub async fn handle_command(session: &mut GameSession, input: &str) -> ResponseResult {
    let command = match input.parse::<PlayerCommand>() {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!(input = %input, error = %e, "Rejected player input");
            return ResponseResult::error(e.code(), e.to_string());
        }
    };
    run_command(session, command).await
}

pub async fn run_command(session: &mut GameSession, command: PlayerCommand) -> ResponseResult {
    let tag = command.tag();
    match dispatch(session, command) {
        Ok(Follow::Tick) => {
            session.tick().await;
        }
        Ok(Follow::Done) => {}
        Err(e) => {
            tracing::info!(command = tag, error = %e, "Player command rejected");
            return ResponseResult::error(e.code(), e.to_string());
        }
    }
    tracing::debug!(command = tag, "Player command handled");
    ResponseResult::success(session.game.player.take_notifications())
}

fn require_state(
    session: &GameSession,
    command: &'static str,
    expected: GameState,
) -> Result<(), CommandError> {
    let state = session.game.game_state();
    if state != expected {
        return Err(CommandError::wrong_phase(
            command,
            format!("only available in {expected}, the player is in {state}"),
        ));
    }
    Ok(())
}

fn dispatch(session: &mut GameSession, command: PlayerCommand) -> Result<Follow, HandlerError> {
    let tag = command.tag();
    match command {
        PlayerCommand::CombatKickOff => {
            require_state(session, tag, GameState::Dungeon)?;
            let engagement = &session.game.world.dungeon.engagement;
            if !engagement.is_kickoff_phase() {
                return Err(CommandError::wrong_phase(
                    tag,
                    format!("combat is {}", engagement.phase()),
                )
                .into());
            }
            Ok(Follow::Tick)
        }
        PlayerCommand::DrawCards => {
            require_state(session, tag, GameState::Dungeon)?;
            let engagement = &session.game.world.dungeon.engagement;
            if !engagement.is_ongoing_phase() {
                return Err(CommandError::wrong_phase(
                    tag,
                    format!("combat is {}", engagement.phase()),
                )
                .into());
            }
            if session.game.activate_draw_cards()? == 0 {
                return Err(CommandError::wrong_phase(tag, "nobody is left to draw").into());
            }
            Ok(Follow::Tick)
        }
        PlayerCommand::NewRound => {
            require_state(session, tag, GameState::Dungeon)?;
            let engagement = &session.game.world.dungeon.engagement;
            if !engagement.is_ongoing_phase() {
                return Err(CommandError::wrong_phase(
                    tag,
                    format!("combat is {}", engagement.phase()),
                )
                .into());
            }
            session.game.create_combat_round()?;
            Ok(Follow::Done)
        }
        PlayerCommand::PlayCards => {
            require_state(session, tag, GameState::Dungeon)?;
            session.game.activate_play_cards()?;
            Ok(Follow::Tick)
        }
        PlayerCommand::Advancing => {
            require_state(session, tag, GameState::Home)?;
            Ok(Follow::Tick)
        }
        PlayerCommand::Speak { target, content } => {
            require_state(session, tag, GameState::Home)?;
            session.game.activate_speak(&target, &content)?;
            Ok(Follow::Tick)
        }
        PlayerCommand::Whisper { target, content } => {
            require_state(session, tag, GameState::Home)?;
            session.game.activate_whisper(&target, &content)?;
            Ok(Follow::Tick)
        }
        PlayerCommand::Announce { content } => {
            require_state(session, tag, GameState::Home)?;
            session.game.activate_announce(&content)?;
            Ok(Follow::Tick)
        }
        PlayerCommand::LaunchDungeon => {
            require_state(session, tag, GameState::Home)?;
            session.game.launch_dungeon()?;
            Ok(Follow::Done)
        }
        PlayerCommand::NextDungeon => {
            require_state(session, tag, GameState::Dungeon)?;
            let engagement = &session.game.world.dungeon.engagement;
            if !engagement.is_post_wait_phase() || !engagement.has_hero_won() {
                return Err(CommandError::wrong_phase(
                    tag,
                    "the party has to win the current combat first",
                )
                .into());
            }
            session.game.advance_next_dungeon()?;
            Ok(Follow::Done)
        }
        PlayerCommand::GoHome => {
            require_state(session, tag, GameState::Dungeon)?;
            let engagement = &session.game.world.dungeon.engagement;
            if !engagement.is_post_wait_phase() {
                return Err(CommandError::wrong_phase(
                    tag,
                    format!("combat is {}", engagement.phase()),
                )
                .into());
            }
            session.game.return_to_home()?;
            Ok(Follow::Done)
        }
        PlayerCommand::XCard {
            name,
            description,
            effect,
        } => {
            session.game.activate_xcard(Skill {
                name,
                description,
                effect,
            })?;
            Ok(Follow::Done)
        }
        PlayerCommand::Teleport { stage } => {
            if !session.game.settings.debug_commands {
                return Err(CommandError::DebugDisabled.into());
            }
            session.game.teleport(&stage)?;
            Ok(Follow::Done)
        }
        PlayerCommand::Quit => {
            session.game.request_exit();
            Ok(Follow::Done)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dungeonforge_domain::CombatPhase;

    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::test_fixtures::memory_repo::MemoryWorldRepo;
    use crate::test_fixtures::worlds;

    fn session() -> GameSession {
        let game = worlds::game_with_replies(Vec::new());
        GameSession::new(
            game,
            Arc::new(MemoryWorldRepo::default()),
            Arc::new(SystemClock::new()),
        )
    }

    fn code(result: &ResponseResult) -> Option<ErrorCode> {
        match result {
            ResponseResult::Error { code, .. } => Some(*code),
            ResponseResult::Success { .. } => None,
        }
    }

    #[tokio::test]
    async fn unknown_tags_are_reported_with_their_code() {
        let mut session = session();
        let result = handle_command(&mut session, "/dance").await;
        assert_eq!(code(&result), Some(ErrorCode::UnknownCommand));
        assert_eq!(session.ticks(), 0);
    }

    #[tokio::test]
    async fn combat_commands_are_refused_at_home() {
        let mut session = session();
        for input in ["draw_cards", "play_cards", "new_round", "dungeon_combat_kick_off"] {
            let result = handle_command(&mut session, input).await;
            assert_eq!(code(&result), Some(ErrorCode::WrongPhase), "{input}");
        }
        assert_eq!(session.ticks(), 0);
    }

    #[tokio::test]
    async fn launching_moves_the_party_without_a_tick() {
        let mut session = session();
        let result = handle_command(&mut session, "/dungeon").await;

        assert!(result.is_success());
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.game.game_state(), GameState::Dungeon);
        assert_eq!(
            session.game.world.dungeon.engagement.phase(),
            CombatPhase::KickOff
        );

        let again = handle_command(&mut session, "/dungeon").await;
        assert_eq!(code(&again), Some(ErrorCode::WrongPhase));
    }

    #[tokio::test]
    async fn going_home_waits_for_the_combat_to_end() {
        let mut session = session();
        handle_command(&mut session, "/dungeon").await;

        let home = handle_command(&mut session, "/home").await;
        assert_eq!(code(&home), Some(ErrorCode::WrongPhase));
        let next = handle_command(&mut session, "/next_dungeon").await;
        assert_eq!(code(&next), Some(ErrorCode::WrongPhase));
    }

    #[tokio::test]
    async fn teleport_needs_debug_commands() {
        let mut session = session();
        let refused = handle_command(&mut session, &format!("/tp {}", worlds::ROAD)).await;
        assert_eq!(code(&refused), Some(ErrorCode::DebugDisabled));

        session.game.settings.debug_commands = true;
        let moved = handle_command(&mut session, &format!("/tp {}", worlds::ROAD)).await;
        assert!(moved.is_success());
        let road = session.game.stage_entity(worlds::ROAD).expect("road");
        assert_eq!(session.game.player_stage(), Some(road));

        let missing = handle_command(&mut session, "/tp Atlantis").await;
        assert_eq!(code(&missing), Some(ErrorCode::InvalidTarget));
    }

    #[tokio::test]
    async fn xcard_without_a_name_is_a_bad_request() {
        let mut session = session();
        let result = handle_command(&mut session, "/xcard").await;
        assert_eq!(code(&result), Some(ErrorCode::BadRequest));

        let ok = handle_command(&mut session, "/xcard Meteor | falls | 40 fire damage").await;
        assert!(ok.is_success());
    }

    #[tokio::test]
    async fn quit_requests_exit() {
        let mut session = session();
        let result = handle_command(&mut session, "/quit").await;
        assert!(result.is_success());
        assert!(!session.is_running());
    }
}
