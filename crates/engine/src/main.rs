//! Dungeonforge Engine - command-line entry point.
//!
//! Reads player commands from stdin, one per line, and prints each
//! [`ResponseResult`](dungeonforge_shared::ResponseResult) as JSON.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dungeonforge_engine::api::handle_command;
use dungeonforge_engine::chat::ChatSystem;
use dungeonforge_engine::demo;
use dungeonforge_engine::game::TcgGame;
use dungeonforge_engine::infrastructure::{
    chat_client::HttpChatClient,
    clock::{SeededRandom, SystemClock, SystemRandom},
    ports::{ChatPort, ClockPort, RandomPort, WorldRepo},
    resilient_chat::{ResilientChatClient, RetryConfig},
    settings::Settings,
    world_store::JsonWorldStore,
};
use dungeonforge_engine::player::PlayerProxy;
use dungeonforge_engine::session::{load_world, GameSession};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dungeonforge_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(
        chat_url = %settings.chat_url,
        save_dir = %settings.save_dir.display(),
        turn_order = %settings.turn_order,
        "Starting Dungeonforge Engine"
    );

    let retry_config = RetryConfig::default();
    tracing::info!(
        "Chat client configured with retry: max_retries={}, base_delay_ms={}",
        retry_config.max_retries,
        retry_config.base_delay_ms
    );
    let http = Arc::new(HttpChatClient::new(&settings.chat_url));
    let chat_port: Arc<dyn ChatPort> = Arc::new(ResilientChatClient::new(http, retry_config));
    let chat = ChatSystem::new(chat_port, settings.chat_timeout)
        .with_user_name(settings.player_name.clone());

    let random: Arc<dyn RandomPort> = match settings.seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(SystemRandom::new()),
    };
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let store: Arc<dyn WorldRepo> = Arc::new(JsonWorldStore::new(settings.save_dir.clone()));

    let world = load_world(store.as_ref(), demo::WORLD_NAME, || Some(demo::world()))
        .await
        .context("could not load the world")?;
    let player = PlayerProxy::new(settings.player_name.clone(), demo::PLAYER_ACTOR);
    let mut game = TcgGame::new(world, player, chat, random, settings);
    game.load_entities()
        .context("could not build the world's entities")?;

    let mut session = GameSession::new(game, store, clock);
    session.initialize();
    run(&mut session).await?;
    session.tear_down();
    Ok(())
}

async fn run(session: &mut GameSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while session.is_running() {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        session.game.player.enqueue_command(line);

        while let Some(input) = session.game.player.next_command() {
            let response = handle_command(session, &input).await;
            let json = serde_json::to_string_pretty(&response)?;
            stdout.write_all(json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
