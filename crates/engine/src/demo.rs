//! Built-in demo world, used when no saved document exists yet.
//!
//! Two home stages (a village square and a tavern), a narrator world system
//! and a two-level dungeon beneath the old mill.

use dungeonforge_domain::{
    ActorInstance, ActorPrototype, ActorType, BaseAttributes, Boot, DataBase, Dungeon, Guid,
    StageInstance, StagePrototype, StageType, WorldRuntime, WorldSystemInstance,
    WorldSystemPrototype,
};

pub const WORLD_NAME: &str = "Emberfall";
pub const PLAYER_ACTOR: &str = "Sera";

const EPOCH_SCRIPT: &str = "The mill of Emberfall fell silent a month ago. Since then, \
things crawl out of its cellars at night and the village watch is down to two tired men.";

struct ActorSeed {
    name: &'static str,
    actor_type: ActorType,
    attributes: BaseAttributes,
    system_message: &'static str,
    appearance: &'static str,
}

const ACTORS: &[ActorSeed] = &[
    ActorSeed {
        name: "Sera",
        actor_type: ActorType::Hero,
        attributes: BaseAttributes::new(4, 6, 5),
        system_message: "You are Sera, a sellsword who came back to her home village.",
        appearance: "Lean, scarred knuckles, a short sword at the hip",
    },
    ActorSeed {
        name: "Brother Aldo",
        actor_type: ActorType::Hero,
        attributes: BaseAttributes::new(2, 3, 8),
        system_message: "You are Brother Aldo, the village priest. You heal and you worry.",
        appearance: "Grey robes, a wooden sun on a cord",
    },
    ActorSeed {
        name: "Marta",
        actor_type: ActorType::Hero,
        attributes: BaseAttributes::new(1, 4, 6),
        system_message: "You are Marta, who keeps the tavern and hears every rumour.",
        appearance: "Flour on her apron, sharp eyes",
    },
    ActorSeed {
        name: "Cellar Rat",
        actor_type: ActorType::Monster,
        attributes: BaseAttributes::new(-3, 8, 1),
        system_message: "You are a rat the size of a dog. You bite what moves.",
        appearance: "Matted fur, yellow teeth",
    },
    ActorSeed {
        name: "Mill Ghoul",
        actor_type: ActorType::Monster,
        attributes: BaseAttributes::new(3, 2, 2),
        system_message: "You were the miller. Now you are hungry.",
        appearance: "Grey skin, a miller's cap, too many teeth",
    },
];

struct StageSeed {
    name: &'static str,
    stage_type: StageType,
    system_message: &'static str,
}

const STAGES: &[StageSeed] = &[
    StageSeed {
        name: "Village Square",
        stage_type: StageType::Home,
        system_message: "You are the village square of Emberfall: a well, a notice board, mud.",
    },
    StageSeed {
        name: "Copper Kettle",
        stage_type: StageType::Home,
        system_message: "You are the Copper Kettle tavern, warm and crowded.",
    },
    StageSeed {
        name: "Mill Cellar",
        stage_type: StageType::Dungeon,
        system_message: "You are the flooded cellar under the mill. Water drips everywhere.",
    },
    StageSeed {
        name: "Grinding Room",
        stage_type: StageType::Dungeon,
        system_message: "You are the grinding room. The millstone turns by itself.",
    },
];

const NARRATOR: &str = "Narrator";

fn actor(name: &str, guid: u64, kick_off_message: &str) -> ActorInstance {
    ActorInstance {
        name: name.to_string(),
        prototype: name.to_string(),
        guid: Guid::new(guid),
        kick_off_message: kick_off_message.to_string(),
    }
}

fn stage(name: &str, guid: u64, kick_off_message: &str, actors: Vec<ActorInstance>) -> StageInstance {
    StageInstance {
        name: name.to_string(),
        prototype: name.to_string(),
        guid: Guid::new(guid),
        kick_off_message: kick_off_message.to_string(),
        actors,
    }
}

fn data_base() -> DataBase {
    let actors = ACTORS
        .iter()
        .map(|seed| {
            (
                seed.name.to_string(),
                ActorPrototype {
                    name: seed.name.to_string(),
                    system_message: seed.system_message.to_string(),
                    appearance: seed.appearance.to_string(),
                    actor_type: seed.actor_type,
                    attributes: seed.attributes,
                },
            )
        })
        .collect();
    let stages = STAGES
        .iter()
        .map(|seed| {
            (
                seed.name.to_string(),
                StagePrototype {
                    name: seed.name.to_string(),
                    system_message: seed.system_message.to_string(),
                    stage_type: seed.stage_type,
                },
            )
        })
        .collect();
    let world_systems = [(
        NARRATOR.to_string(),
        WorldSystemPrototype {
            name: NARRATOR.to_string(),
            system_message: "You watch over Emberfall and keep its story consistent.".to_string(),
        },
    )]
    .into_iter()
    .collect();
    DataBase {
        actors,
        stages,
        world_systems,
    }
}

pub fn boot() -> Boot {
    Boot {
        name: WORLD_NAME.to_string(),
        epoch_script: EPOCH_SCRIPT.to_string(),
        stages: vec![
            stage(
                "Village Square",
                100,
                "Dusk. The notice board offers a reward for clearing the mill.",
                vec![
                    actor("Sera", 1, "You just read the notice about the mill."),
                    actor("Brother Aldo", 2, "You promised to go with Sera."),
                ],
            ),
            stage(
                "Copper Kettle",
                101,
                "The fire is lit and the stew is thin.",
                vec![actor("Marta", 3, "You have heard scratching from the mill at night.")],
            ),
        ],
        world_systems: vec![WorldSystemInstance {
            name: NARRATOR.to_string(),
            prototype: NARRATOR.to_string(),
            guid: Guid::new(900),
            kick_off_message: "Keep track of what the heroes learn.".to_string(),
        }],
        data_base: data_base(),
    }
}

pub fn dungeon() -> Dungeon {
    Dungeon::new(
        "The Old Mill",
        vec![
            stage(
                "Mill Cellar",
                200,
                "Knee-deep water, and something moving in it.",
                vec![actor("Cellar Rat", 10, "You smell warm blood coming down the stairs.")],
            ),
            stage(
                "Grinding Room",
                201,
                "Flour hangs in the air like fog.",
                vec![actor("Mill Ghoul", 11, "Intruders in your mill.")],
            ),
        ],
    )
}

pub fn world() -> WorldRuntime {
    WorldRuntime::new(boot(), dungeon())
}
