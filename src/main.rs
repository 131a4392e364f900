use std::env;
use std::sync::Arc;

use jukebot::commands::music::utils::audio_sources::YoutubeDlResolver;
use jukebot::commands::music::utils::music_manager::{SongbirdPlayer, SongbirdVoice};
use jukebot::commands::music::utils::scheduler::TrackScheduler;
use jukebot::config::Config;
use jukebot::gateway::SerenityGateway;
use jukebot::{commands, events, Dispatcher, Error, Services};
use serenity::all::{ClientBuilder, GatewayIntents};
use songbird::{SerenityInit, Songbird};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(Config::log_filter()))
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = Config::from_args(env::args())?;

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES;

    let http_client = reqwest::Client::new();
    let player = Arc::new(SongbirdPlayer::new(http_client.clone()));
    let scheduler = TrackScheduler::spawn(
        player.clone(),
        Arc::new(YoutubeDlResolver::new(http_client)),
    );

    let songbird = Songbird::serenity();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let mut client = ClientBuilder::new(&config.token, intents)
        .event_handler(events::Handler::new(events_tx))
        .register_songbird_with(songbird.clone())
        .await?;

    let services = Services {
        gateway: Arc::new(SerenityGateway::new(client.http.clone(), client.cache.clone())),
        voice: Arc::new(SongbirdVoice::new(songbird, player)),
        scheduler,
    };
    let dispatcher = Dispatcher::new(commands::table()?, services);
    tokio::spawn(dispatcher.run(events_rx));

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received, closing shards");
        shard_manager.shutdown_all().await;
    });

    client.start().await.map_err(Into::into)
}
