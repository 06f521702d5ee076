//! Environment-backed engine settings.
//!
//! Every knob has a default so a bare `.env`-less run works against a local
//! chat endpoint. Malformed values are configuration errors (exit code 1).

use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::chat_client::DEFAULT_CHAT_URL;

// ============================================================================
// Turn Order Policy
// ============================================================================

/// How a new round orders its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnOrderPolicy {
    /// Uniform shuffle driven by the injected random source.
    #[default]
    Shuffle,
    /// Highest dexterity first; ties keep stage order.
    Dexterity,
}

impl std::fmt::Display for TurnOrderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnOrderPolicy::Shuffle => write!(f, "shuffle"),
            TurnOrderPolicy::Dexterity => write!(f, "dexterity"),
        }
    }
}

impl std::str::FromStr for TurnOrderPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shuffle" | "random" => Ok(TurnOrderPolicy::Shuffle),
            "dexterity" | "dex" => Ok(TurnOrderPolicy::Dexterity),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value {value:?} for {key}")]
pub struct SettingsError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub chat_url: String,
    pub chat_timeout: Duration,
    pub save_dir: PathBuf,
    pub player_name: String,
    /// Skills requested per draw.
    pub skill_draw_count: usize,
    pub turn_order: TurnOrderPolicy,
    pub seed: Option<u64>,
    /// Enables `/tp` and other commands that bypass the combat state machine.
    pub debug_commands: bool,
    /// Actor permits granted per home tick.
    pub actors_per_tick: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            chat_timeout: Duration::from_secs(30),
            save_dir: PathBuf::from("saves"),
            player_name: "player".to_string(),
            skill_draw_count: 2,
            turn_order: TurnOrderPolicy::Shuffle,
            seed: None,
            debug_commands: false,
            actors_per_tick: 1,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();

        if let Some(url) = lookup("DUNGEONFORGE_CHAT_URL") {
            settings.chat_url = url;
        }
        if let Some(secs) = lookup("DUNGEONFORGE_CHAT_TIMEOUT_SECS") {
            settings.chat_timeout =
                Duration::from_secs(parse_number("DUNGEONFORGE_CHAT_TIMEOUT_SECS", &secs)?);
        }
        if let Some(dir) = lookup("DUNGEONFORGE_SAVE_DIR") {
            settings.save_dir = PathBuf::from(dir);
        }
        if let Some(player) = lookup("DUNGEONFORGE_PLAYER") {
            if player.trim().is_empty() {
                return Err(SettingsError {
                    key: "DUNGEONFORGE_PLAYER",
                    value: player,
                });
            }
            settings.player_name = player;
        }
        if let Some(count) = lookup("DUNGEONFORGE_SKILL_DRAW_COUNT") {
            settings.skill_draw_count =
                parse_number("DUNGEONFORGE_SKILL_DRAW_COUNT", &count)?.max(1) as usize;
        }
        if let Some(order) = lookup("DUNGEONFORGE_TURN_ORDER") {
            settings.turn_order = order.parse().map_err(|_| SettingsError {
                key: "DUNGEONFORGE_TURN_ORDER",
                value: order.clone(),
            })?;
        }
        if let Some(seed) = lookup("DUNGEONFORGE_SEED") {
            settings.seed = Some(parse_number("DUNGEONFORGE_SEED", &seed)?);
        }
        if let Some(flag) = lookup("DUNGEONFORGE_DEBUG_COMMANDS") {
            settings.debug_commands = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(SettingsError {
                        key: "DUNGEONFORGE_DEBUG_COMMANDS",
                        value: flag,
                    })
                }
            };
        }
        if let Some(count) = lookup("DUNGEONFORGE_ACTORS_PER_TICK") {
            settings.actors_per_tick =
                parse_number("DUNGEONFORGE_ACTORS_PER_TICK", &count)?.max(1) as usize;
        }

        Ok(settings)
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError {
        key,
        value: value.to_string(),
    })
}
