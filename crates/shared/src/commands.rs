//! Player command tags.
//!
//! Combat path: `dungeon_combat_kick_off`, `draw_cards`, `new_round`, `play_cards`.
//! Home path: `/advancing`, `/speak @target text`, `/whisper @target text`,
//! `/announce text`, `/dungeon`. After a combat: `/next_dungeon`, `/home`.
//! Always: `/xcard name | description | effect`, `/tp stage` (debug), `/quit`.

use std::str::FromStr;

use thiserror::Error;

use crate::responses::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    CombatKickOff,
    DrawCards,
    NewRound,
    PlayCards,
    Advancing,
    Speak { target: String, content: String },
    Whisper { target: String, content: String },
    Announce { content: String },
    LaunchDungeon,
    NextDungeon,
    GoHome,
    XCard {
        name: String,
        description: String,
        effect: String,
    },
    Teleport { stage: String },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Command {command} is missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Command {command} not allowed: {reason}")]
    WrongPhase {
        command: &'static str,
        reason: String,
    },
    #[error("Debug commands are disabled")]
    DebugDisabled,
}

impl CommandError {
    pub fn wrong_phase(command: &'static str, reason: impl Into<String>) -> Self {
        Self::WrongPhase {
            command,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownCommand(_) => ErrorCode::UnknownCommand,
            Self::MissingArgument { .. } => ErrorCode::BadRequest,
            Self::InvalidTarget(_) => ErrorCode::InvalidTarget,
            Self::WrongPhase { .. } => ErrorCode::WrongPhase,
            Self::DebugDisabled => ErrorCode::DebugDisabled,
        }
    }
}

impl PlayerCommand {
    /// Canonical tag, as typed by the player.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CombatKickOff => "dungeon_combat_kick_off",
            Self::DrawCards => "draw_cards",
            Self::NewRound => "new_round",
            Self::PlayCards => "play_cards",
            Self::Advancing => "/advancing",
            Self::Speak { .. } => "/speak",
            Self::Whisper { .. } => "/whisper",
            Self::Announce { .. } => "/announce",
            Self::LaunchDungeon => "/dungeon",
            Self::NextDungeon => "/next_dungeon",
            Self::GoHome => "/home",
            Self::XCard { .. } => "/xcard",
            Self::Teleport { .. } => "/tp",
            Self::Quit => "/quit",
        }
    }
}

/// Split `@target rest of text` into its parts.
fn parse_addressed(
    command: &'static str,
    rest: &str,
) -> Result<(String, String), CommandError> {
    let rest = rest.trim();
    let Some(addressed) = rest.strip_prefix('@') else {
        return Err(CommandError::MissingArgument {
            command,
            argument: "@target",
        });
    };
    let (target, content) = addressed.split_once(char::is_whitespace).unwrap_or((addressed, ""));
    if target.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "@target",
        });
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "content",
        });
    }
    Ok((target.to_string(), content.to_string()))
}

impl FromStr for PlayerCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        match head {
            "dungeon_combat_kick_off" => Ok(Self::CombatKickOff),
            "draw_cards" => Ok(Self::DrawCards),
            "new_round" => Ok(Self::NewRound),
            "play_cards" => Ok(Self::PlayCards),
            "/advancing" => Ok(Self::Advancing),
            "/dungeon" => Ok(Self::LaunchDungeon),
            "/next_dungeon" => Ok(Self::NextDungeon),
            "/home" => Ok(Self::GoHome),
            "/quit" => Ok(Self::Quit),
            "/speak" => {
                let (target, content) = parse_addressed("/speak", rest)?;
                Ok(Self::Speak { target, content })
            }
            "/whisper" => {
                let (target, content) = parse_addressed("/whisper", rest)?;
                Ok(Self::Whisper { target, content })
            }
            "/announce" => {
                let content = rest.trim();
                if content.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "/announce",
                        argument: "content",
                    });
                }
                Ok(Self::Announce {
                    content: content.to_string(),
                })
            }
            "/tp" => {
                let stage = rest.trim();
                if stage.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "/tp",
                        argument: "stage",
                    });
                }
                Ok(Self::Teleport {
                    stage: stage.to_string(),
                })
            }
            "/xcard" => {
                let mut parts = rest.split('|').map(str::trim);
                let name = parts.next().unwrap_or_default();
                if name.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "/xcard",
                        argument: "name",
                    });
                }
                Ok(Self::XCard {
                    name: name.to_string(),
                    description: parts.next().unwrap_or_default().to_string(),
                    effect: parts.next().unwrap_or_default().to_string(),
                })
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}
