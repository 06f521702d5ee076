//! A small authored world and games built on it.
//!
//! - `Camp` (home): Aria (the player's hero) and Borin
//! - `Road` (home): empty
//! - `Goblin Warren` dungeon with a single level, `Cave`, holding one goblin
//!
//! No kickoff messages and no world systems, so a fresh game has exactly one
//! system message per agent.

use std::sync::Arc;
use std::time::Duration;

use dungeonforge_domain::components::{CombatRoleComponent, HandComponent};
use dungeonforge_domain::{
    ActorInstance, ActorPrototype, ActorType, BaseAttributes, Boot, DataBase, Dungeon, Guid,
    HandDetail, RpgCharacterProfile, Skill, StageInstance, StagePrototype, StageType,
    WorldRuntime,
};

use super::scripted_chat::ScriptedChat;
use crate::chat::ChatSystem;
use crate::game::TcgGame;
use crate::infrastructure::clock::FixedRandom;
use crate::infrastructure::settings::Settings;
use crate::player::PlayerProxy;

pub const WORLD: &str = "Ashen Vale";
pub const PLAYER: &str = "player";

pub const HERO: &str = "Aria";
pub const COMPANION: &str = "Borin";
pub const MONSTER: &str = "Goblin";
/// Gives the goblin a max hp of 10.
pub const MONSTER_STRENGTH: i64 = -4;

pub const CAMP: &str = "Camp";
pub const ROAD: &str = "Road";
pub const DUNGEON: &str = "Goblin Warren";
pub const CAVE: &str = "Cave";

fn actor_prototype(
    name: &str,
    actor_type: ActorType,
    attributes: BaseAttributes,
) -> (String, ActorPrototype) {
    (
        name.to_string(),
        ActorPrototype {
            name: name.to_string(),
            system_message: format!("You are {name}."),
            appearance: format!("{name}, as plain as can be"),
            actor_type,
            attributes,
        },
    )
}

fn stage_prototype(name: &str, stage_type: StageType) -> (String, StagePrototype) {
    (
        name.to_string(),
        StagePrototype {
            name: name.to_string(),
            system_message: format!("You are the stage {name}."),
            stage_type,
        },
    )
}

fn actor(name: &str, guid: u64) -> ActorInstance {
    ActorInstance {
        name: name.to_string(),
        prototype: name.to_string(),
        guid: Guid::new(guid),
        kick_off_message: String::new(),
    }
}

fn stage(name: &str, guid: u64, actors: Vec<ActorInstance>) -> StageInstance {
    StageInstance {
        name: name.to_string(),
        prototype: name.to_string(),
        guid: Guid::new(guid),
        kick_off_message: String::new(),
        actors,
    }
}

pub fn boot() -> Boot {
    let data_base = DataBase {
        actors: [
            actor_prototype(HERO, ActorType::Hero, BaseAttributes::new(5, 6, 5)),
            actor_prototype(COMPANION, ActorType::Hero, BaseAttributes::new(4, 3, 2)),
            actor_prototype(
                MONSTER,
                ActorType::Monster,
                BaseAttributes::new(MONSTER_STRENGTH, 9, 1),
            ),
        ]
        .into_iter()
        .collect(),
        stages: [
            stage_prototype(CAMP, StageType::Home),
            stage_prototype(ROAD, StageType::Home),
            stage_prototype(CAVE, StageType::Dungeon),
        ]
        .into_iter()
        .collect(),
        world_systems: Default::default(),
    };
    Boot {
        name: WORLD.to_string(),
        epoch_script: "An age of ash and embers.".to_string(),
        stages: vec![
            stage(CAMP, 1001, vec![actor(HERO, 1), actor(COMPANION, 2)]),
            stage(ROAD, 1002, Vec::new()),
        ],
        world_systems: Vec::new(),
        data_base,
    }
}

pub fn dungeon() -> Dungeon {
    Dungeon::new(DUNGEON, vec![stage(CAVE, 2001, vec![actor(MONSTER, 3)])])
}

pub fn world() -> WorldRuntime {
    WorldRuntime::new(boot(), dungeon())
}

/// Deterministic settings: fixed random source, shuffle turn order.
pub fn settings() -> Settings {
    Settings {
        player_name: PLAYER.to_string(),
        ..Settings::default()
    }
}

/// Wrap `world` in a game wired to `chat` and load its entities.
pub fn game(world: WorldRuntime, chat: Arc<ScriptedChat>) -> TcgGame {
    let settings = settings();
    let chat = ChatSystem::new(chat, Duration::from_secs(5)).with_user_name(PLAYER);
    let mut game = TcgGame::new(
        world,
        PlayerProxy::new(PLAYER, HERO),
        chat,
        Arc::new(FixedRandom(0)),
        settings,
    );
    game.load_entities().expect("entities load");
    game
}

pub fn game_with_chat() -> (TcgGame, Arc<ScriptedChat>) {
    let chat = Arc::new(ScriptedChat::new());
    (game(world(), chat.clone()), chat)
}

/// A fresh game whose endpoint answers `(agent, reply)` in order.
pub fn game_with_replies(replies: Vec<(&str, String)>) -> TcgGame {
    let (game, chat) = game_with_chat();
    for (agent, reply) in replies {
        chat.push(agent, reply);
    }
    game
}

/// Restore a saved document into a new game with an empty script.
pub fn restore(world: WorldRuntime) -> TcgGame {
    game(world, Arc::new(ScriptedChat::new()))
}

/// The party inside the cave with fresh combat roles and the combat ongoing,
/// skipping the kickoff exchange. Notifications from the way in are dropped.
pub fn ongoing_combat_game(replies: Vec<(&str, String)>) -> TcgGame {
    let mut game = game_with_replies(replies);
    game.launch_dungeon().expect("launch");
    let cave = game.stage_entity(CAVE).expect("cave");
    for entity in game.actors_on_stage(cave) {
        let name = game.entity_name(entity).to_string();
        let attributes = game.actor_prototype(&name).expect("prototype").attributes;
        game.store
            .replace(
                entity,
                CombatRoleComponent {
                    name,
                    profile: RpgCharacterProfile::from_attributes(attributes),
                    status_effects: Vec::new(),
                },
            )
            .expect("combat role");
    }
    game.world
        .dungeon
        .engagement
        .combat_ongoing()
        .expect("ongoing");
    game.player.take_notifications();
    game
}

/// One "Slash" card for every living combatant.
pub fn give_hands(game: &mut TcgGame) {
    let slash = Skill {
        name: "Slash".to_string(),
        description: "A quick cut".to_string(),
        effect: "Deals 4 physical damage".to_string(),
    };
    for entity in game.combat_participants() {
        let name = game.entity_name(entity).to_string();
        game.store
            .replace(
                entity,
                HandComponent {
                    name,
                    skills: vec![slash.clone()],
                    details: vec![HandDetail {
                        skill: slash.name.clone(),
                        targets: Vec::new(),
                        reason: String::new(),
                        dialogue: String::new(),
                    }],
                },
            )
            .expect("hand");
    }
}
