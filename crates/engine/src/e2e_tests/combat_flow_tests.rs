//! Combat scenarios from the first command to the end of the fight.

use std::sync::Arc;
use std::time::Duration;

use dungeonforge_domain::components::{CombatRoleComponent, HandComponent, PlayCardAction};
use dungeonforge_domain::{CombatPhase, CombatResult};
use dungeonforge_shared::ErrorCode;
use serde_json::json;

use super::{event_types, feedback_reply, E2EContext, RULING};
use crate::chat::ChatSystem;
use crate::game::{GameState, TcgGame};
use crate::infrastructure::clock::SeededRandom;
use crate::player::PlayerProxy;
use crate::test_fixtures::scripted_chat::ScriptedChat;
use crate::test_fixtures::worlds;

fn role(ctx: &E2EContext, name: &str) -> CombatRoleComponent {
    let entity = ctx.game().actor_entity(name).expect("actor");
    ctx.game().combat_role(entity).expect("combat role").clone()
}

#[tokio::test]
async fn single_round_hero_victory() {
    let mut ctx = E2EContext::new();
    ctx.enter_combat().await;
    assert_eq!(ctx.game().world.dungeon.engagement.phase(), CombatPhase::Ongoing);
    for name in [worlds::HERO, worlds::COMPANION, worlds::MONSTER] {
        let entity = ctx.game().actor_entity(name).expect("actor");
        assert!(ctx.game().store.has::<HandComponent>(entity), "{name} holds a hand");
    }

    ctx.push_cards();
    ctx.push(worlds::CAVE, RULING);
    ctx.push(worlds::HERO, feedback_reply(100, json!([])));
    ctx.push(worlds::COMPANION, feedback_reply(88, json!([])));
    ctx.push(worlds::MONSTER, feedback_reply(0, json!([])));
    ctx.push(worlds::HERO, "We cleared the cave. Borin took a scratch.");
    ctx.push(worlds::COMPANION, "The goblin fell quickly.");

    let notifications = ctx.ok("play_cards").await;

    let engagement = &ctx.game().world.dungeon.engagement;
    assert_eq!(engagement.phase(), CombatPhase::PostWait);
    assert_eq!(engagement.result(), CombatResult::HeroWin);
    assert!(engagement.last_round().expect("round").is_complete());
    let combat = engagement.last_combat().expect("combat");
    assert!(combat.summarize_report.contains_key(worlds::HERO));
    assert!(combat.summarize_report.contains_key(worlds::COMPANION));

    assert!(ctx.game().actor_entity(worlds::MONSTER).is_none());
    assert_eq!(role(&ctx, worlds::COMPANION).profile.hp(), 88);

    let types = event_types(&notifications);
    for expected in ["CombatPerformanceEvent", "CombatDeathEvent", "CombatCompleteEvent"] {
        assert!(types.iter().any(|t| t == expected), "missing {expected} in {types:?}");
    }

    // The combat slice of the log was folded into the journal.
    assert!(ctx.history_contains(worlds::HERO, "You went through a combat!"));
    assert!(ctx.history_contains(worlds::HERO, "We cleared the cave."));
    assert!(!ctx.history_contains(worlds::HERO, "Combat round 1 begins!"));

    // The saved document already holds the finished combat.
    let saved = ctx.repo.saved_world(worlds::WORLD).expect("saved");
    assert_eq!(saved.dungeon.engagement.phase(), CombatPhase::PostWait);

    // Single-level dungeon: there is nowhere further to go.
    assert_eq!(ctx.error_code("/next_dungeon").await, ErrorCode::BadRequest);

    ctx.ok("/home").await;
    assert_eq!(ctx.game().game_state(), GameState::Home);
    assert!(ctx.game().world.dungeon.is_empty());
    let hero = ctx.game().actor_entity(worlds::HERO).expect("hero");
    assert!(ctx.game().combat_role(hero).is_none());
}

#[tokio::test]
async fn status_effects_expire_at_the_round_boundary() {
    let mut ctx = E2EContext::new();
    ctx.enter_combat().await;

    ctx.push_cards();
    ctx.push(worlds::CAVE, RULING);
    ctx.push(
        worlds::HERO,
        feedback_reply(
            96,
            json!([
                {"name": "Poisoned", "description": "Loses 2 hp a round", "rounds": 1},
                {"name": "Blessed", "description": "Strikes truer", "rounds": 3}
            ]),
        ),
    );
    ctx.push(worlds::COMPANION, feedback_reply(90, json!([])));
    ctx.push(worlds::MONSTER, feedback_reply(3, json!([])));

    ctx.ok("play_cards").await;

    let hero = role(&ctx, worlds::HERO);
    assert_eq!(hero.profile.hp(), 96);
    assert_eq!(hero.status_effects.len(), 1);
    assert_eq!(hero.status_effects[0].name, "Blessed");
    assert_eq!(hero.status_effects[0].rounds, 2);

    let history = ctx.game().memory.history(worlds::HERO);
    let status = history.last().expect("status notice").content();
    assert!(status.starts_with("# Notice! Your status after round 1"));
    assert!(status.contains("Expired: Poisoned"));

    // The goblin still stands, so the fight goes on and a fresh round opens.
    let engagement = &ctx.game().world.dungeon.engagement;
    assert_eq!(engagement.phase(), CombatPhase::Ongoing);
    ctx.ok("new_round").await;
    assert_eq!(ctx.game().world.dungeon.engagement.rounds().len(), 2);
}

#[tokio::test]
async fn malformed_card_choice_is_rolled_back_and_the_round_retried() {
    let mut ctx = E2EContext::new();
    ctx.enter_combat().await;
    let companion_log = ctx.game().memory.len(worlds::COMPANION);
    let director_calls = ctx.chat.requests_for(worlds::CAVE).len();

    ctx.push(worlds::HERO, super::play_reply("Slash", worlds::MONSTER));
    ctx.push(worlds::COMPANION, super::play_reply("Fireball", worlds::MONSTER));
    ctx.push(worlds::MONSTER, super::play_reply("Bite", worlds::HERO));
    ctx.ok("play_cards").await;

    assert_eq!(ctx.game().memory.len(worlds::COMPANION), companion_log);
    assert_eq!(ctx.chat.requests_for(worlds::CAVE).len(), director_calls);
    let engagement = &ctx.game().world.dungeon.engagement;
    assert_eq!(engagement.phase(), CombatPhase::Ongoing);
    assert!(!engagement.last_round().expect("round").is_complete());
    for entity in ctx.game().combat_participants() {
        assert!(!ctx.game().store.has::<PlayCardAction>(entity));
    }

    // Same round, same hands, a clean second attempt.
    ctx.push_cards();
    ctx.push(worlds::CAVE, RULING);
    ctx.push(worlds::HERO, feedback_reply(98, json!([])));
    ctx.push(worlds::COMPANION, feedback_reply(90, json!([])));
    ctx.push(worlds::MONSTER, feedback_reply(5, json!([])));
    ctx.ok("play_cards").await;

    let engagement = &ctx.game().world.dungeon.engagement;
    assert_eq!(engagement.rounds().len(), 1);
    assert!(engagement.last_round().expect("round").is_complete());
    assert_eq!(role(&ctx, worlds::MONSTER).profile.hp(), 5);
}

fn seeded_context(seed: u64) -> E2EContext {
    let chat = Arc::new(ScriptedChat::new());
    let gateway = ChatSystem::new(chat.clone(), Duration::from_secs(5)).with_user_name(worlds::PLAYER);
    let mut game = TcgGame::new(
        worlds::world(),
        PlayerProxy::new(worlds::PLAYER, worlds::HERO),
        gateway,
        Arc::new(SeededRandom::new(seed)),
        worlds::settings(),
    );
    game.load_entities().expect("entities load");
    E2EContext::with_game(game, chat)
}

#[tokio::test]
async fn turn_order_is_reproducible_under_a_seed() {
    let mut first = seeded_context(7);
    let mut second = seeded_context(7);
    first.enter_combat().await;
    second.enter_combat().await;

    let turns = |ctx: &E2EContext| {
        ctx.game()
            .world
            .dungeon
            .engagement
            .last_round()
            .expect("round")
            .round_turns
            .clone()
    };
    let order = turns(&first);
    assert_eq!(order, turns(&second));

    let mut sorted = order.clone();
    sorted.sort();
    let mut expected = vec![worlds::HERO, worlds::COMPANION, worlds::MONSTER];
    expected.sort();
    assert_eq!(sorted, expected);
}

#[tokio::test]
async fn restored_snapshot_yields_the_same_director_prompt() {
    let mut ctx = E2EContext::new();
    ctx.enter_combat().await;

    // Every card is played but the director is unreachable: the round stays open.
    ctx.push_cards();
    ctx.ok("play_cards").await;
    let original = ctx
        .chat
        .requests_for(worlds::CAVE)
        .pop()
        .expect("director request");
    assert!(original.input.contains("uses Slash on"));

    let saved = ctx.repo.saved_world(worlds::WORLD).expect("saved");
    let chat = Arc::new(ScriptedChat::new());
    let mut restored = E2EContext::with_game(worlds::game(saved, chat.clone()), chat);
    assert_eq!(restored.game().game_state(), GameState::Dungeon);

    restored.push_cards();
    restored.ok("play_cards").await;
    let replayed = restored
        .chat
        .requests_for(worlds::CAVE)
        .pop()
        .expect("director request");

    assert_eq!(replayed.input, original.input);
    assert_eq!(replayed.chat_history.len(), original.chat_history.len());
}
