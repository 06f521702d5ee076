//! Shared context for scenario tests: a session over the test world, its
//! scripted endpoint and the in-memory store it saves to.

use std::sync::Arc;

use dungeonforge_shared::{ErrorCode, ResponseResult};
use serde_json::Value;

use crate::api::handle_command;
use crate::game::TcgGame;
use crate::infrastructure::clock::SystemClock;
use crate::session::GameSession;
use crate::test_fixtures::memory_repo::MemoryWorldRepo;
use crate::test_fixtures::scripted_chat::ScriptedChat;
use crate::test_fixtures::worlds;

pub struct E2EContext {
    pub session: GameSession,
    pub chat: Arc<ScriptedChat>,
    pub repo: Arc<MemoryWorldRepo>,
}

impl E2EContext {
    pub fn new() -> Self {
        let (game, chat) = worlds::game_with_chat();
        Self::with_game(game, chat)
    }

    pub fn with_game(game: TcgGame, chat: Arc<ScriptedChat>) -> Self {
        let repo = Arc::new(MemoryWorldRepo::default());
        let mut session = GameSession::new(game, repo.clone(), Arc::new(SystemClock::new()));
        session.initialize();
        Self {
            session,
            chat,
            repo,
        }
    }

    pub fn game(&self) -> &TcgGame {
        &self.session.game
    }

    pub fn push(&self, agent: &str, reply: impl Into<String>) {
        self.chat.push(agent, reply);
    }

    pub async fn command(&mut self, input: &str) -> ResponseResult {
        handle_command(&mut self.session, input).await
    }

    /// Run a command that must succeed and return its notifications.
    pub async fn ok(&mut self, input: &str) -> Vec<Value> {
        match self.command(input).await {
            ResponseResult::Success { data } => data
                .and_then(|d| d.as_array().cloned())
                .unwrap_or_default(),
            ResponseResult::Error { code, message } => {
                panic!("{input} failed with {code}: {message}")
            }
        }
    }

    pub async fn error_code(&mut self, input: &str) -> ErrorCode {
        match self.command(input).await {
            ResponseResult::Error { code, .. } => code,
            ResponseResult::Success { .. } => panic!("{input} unexpectedly succeeded"),
        }
    }

    pub fn history_contains(&self, agent: &str, needle: &str) -> bool {
        self.game()
            .memory
            .history(agent)
            .iter()
            .any(|m| m.content().contains(needle))
    }

    /// `/dungeon`, kickoff, draw and a new round with every actor answering.
    pub async fn enter_combat(&mut self) {
        self.ok("/dungeon").await;

        self.push(
            worlds::CAVE,
            r#"{"environment_narration":"Water drips somewhere in the dark."}"#,
        );
        for name in [worlds::HERO, worlds::COMPANION, worlds::MONSTER] {
            self.push(name, kickoff_reply());
        }
        self.ok("dungeon_combat_kick_off").await;

        for (name, skill) in SKILLS {
            self.push(name, draw_reply(skill));
        }
        self.ok("draw_cards").await;
        self.ok("new_round").await;
    }

    /// Queue a card for every actor in [`SKILLS`].
    pub fn push_cards(&self) {
        for (name, skill) in SKILLS {
            let target = if name == worlds::MONSTER {
                worlds::HERO
            } else {
                worlds::MONSTER
            };
            self.push(name, play_reply(skill, target));
        }
    }
}

/// The one skill each combatant draws.
pub const SKILLS: [(&str, &str); 3] = [
    (worlds::HERO, "Slash"),
    (worlds::COMPANION, "Shield Bash"),
    (worlds::MONSTER, "Bite"),
];

pub const RULING: &str = r#"{"calculation":"Slash deals 4, Shield Bash deals 3, Bite deals 2.","performance":"Steel and teeth meet in the dark."}"#;

pub fn kickoff_reply() -> String {
    serde_json::json!({"description": "Ready for a fight.", "status_effects": []}).to_string()
}

pub fn draw_reply(skill: &str) -> String {
    serde_json::json!({
        "skills": [{
            "skill": {"name": skill, "description": "A plain attack", "effect": "Deals a few points of damage"},
            "targets": [],
            "reason": "It is what I have",
            "dialogue": "Here goes!"
        }]
    })
    .to_string()
}

pub fn play_reply(skill: &str, target: &str) -> String {
    serde_json::json!({
        "skill": skill,
        "targets": [target],
        "reason": "Closest enemy",
        "dialogue": "Take this!"
    })
    .to_string()
}

pub fn feedback_reply(hp: i64, effects: Value) -> String {
    serde_json::json!({
        "description": "The exchange is over.",
        "update_hp": hp,
        "effects": effects
    })
    .to_string()
}

pub fn event_types(notifications: &[Value]) -> Vec<String> {
    notifications
        .iter()
        .filter_map(|n| n["data"]["event_type"].as_str().map(str::to_string))
        .collect()
}
