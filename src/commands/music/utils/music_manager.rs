use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serenity::all::{ChannelId, GuildId};
use serenity::async_trait;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::YoutubeDl;
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, Songbird, TrackEvent};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::audio_sources::Track;
use super::event_handlers::LifecycleNotifier;
use super::scheduler::{AudioPlayer, LifecycleSink};
use crate::CommandResult;
use crate::gateway::VoiceTransport;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("The track scheduler is no longer running")]
    SchedulerClosed,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Songbird track events forwarded to the scheduler.
const LIFECYCLE_EVENTS: [TrackEvent; 5] = [
    TrackEvent::Playable,
    TrackEvent::Pause,
    TrackEvent::Play,
    TrackEvent::End,
    TrackEvent::Error,
];

/// The track the scheduler last handed over, plus its songbird handle once
/// it is actually running on a call.
struct ActiveTrack {
    track: Track,
    events: LifecycleSink,
    running: Option<(TrackHandle, Arc<AtomicBool>)>,
}

impl ActiveTrack {
    /// Stop the songbird track without reporting it to the scheduler.
    fn silence(&mut self) {
        if let Some((handle, armed)) = self.running.take() {
            release(&handle, &armed);
        }
    }
}

/// Disarm a track's notifiers, then stop it.
fn release(handle: &TrackHandle, armed: &AtomicBool) {
    armed.store(false, Ordering::Release);
    if let Err(e) = handle.stop() {
        debug!("Track {} was already gone: {}", handle.uuid(), e);
    }
}

#[derive(Default)]
struct PlayerInner {
    call: Option<Arc<SerenityMutex<Call>>>,
    active: Option<ActiveTrack>,
}

/// The single process-wide audio player, rendering into whichever voice call
/// is currently attached.
///
/// A track handed over while no call is attached is held until `attach`
/// provides one; audio is never buffered for a call that does not exist yet.
pub struct SongbirdPlayer {
    http: reqwest::Client,
    inner: Mutex<PlayerInner>,
}

impl SongbirdPlayer {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            inner: Mutex::new(PlayerInner::default()),
        }
    }

    /// Route output to `call`, replacing any previous attachment.
    pub async fn attach(&self, call: Arc<SerenityMutex<Call>>) -> MusicResult<()> {
        let mut inner = self.inner.lock().await;

        // Rejoining within the same guild hands back the same call; songbird
        // keeps the running track alive across the channel move.
        if inner
            .call
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &call))
        {
            debug!("Voice call already attached");
            return Ok(());
        }

        inner.call = Some(Arc::clone(&call));

        if let Some(active) = inner.active.as_mut() {
            active.silence();
            info!("Starting '{}' on the newly attached call", active.track.title);
            let running = self.start(&call, &active.track, &active.events).await?;
            active.running = Some(running);
        }

        Ok(())
    }

    async fn start(
        &self,
        call: &Arc<SerenityMutex<Call>>,
        track: &Track,
        events: &LifecycleSink,
    ) -> MusicResult<(TrackHandle, Arc<AtomicBool>)> {
        let input = YoutubeDl::new(self.http.clone(), track.url.clone());
        let handle = call.lock().await.play_input(input.into());
        let armed = arm(&handle, events)?;
        Ok((handle, armed))
    }
}

#[async_trait]
impl AudioPlayer for SongbirdPlayer {
    async fn play(&self, track: Track, events: LifecycleSink) -> MusicResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some(mut previous) = inner.active.take() {
            previous.silence();
        }

        let running = match inner.call.as_ref() {
            Some(call) => Some(self.start(call, &track, &events).await?),
            None => {
                info!(
                    "No voice connection yet; '{}' starts once the bot joins a channel",
                    track.title
                );
                None
            }
        };

        inner.active = Some(ActiveTrack {
            track,
            events,
            running,
        });

        Ok(())
    }

    async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut active) = inner.active.take() {
            info!("Stopping '{}'", active.track.title);
            active.silence();
        }
    }
}

/// Register lifecycle notifiers on a freshly started track. A track that
/// cannot report its lifecycle is stopped again.
fn arm(handle: &TrackHandle, events: &LifecycleSink) -> MusicResult<Arc<AtomicBool>> {
    let armed = Arc::new(AtomicBool::new(true));

    for kind in LIFECYCLE_EVENTS {
        let notifier = LifecycleNotifier::new(kind, events.clone(), Arc::clone(&armed));
        if let Err(e) = handle.add_event(Event::Track(kind), notifier) {
            release(handle, &armed);
            return Err(MusicError::PlaybackError(e.to_string()));
        }
    }

    Ok(armed)
}

/// [`VoiceTransport`] that joins through songbird and attaches the shared player.
pub struct SongbirdVoice {
    manager: Arc<Songbird>,
    player: Arc<SongbirdPlayer>,
}

impl SongbirdVoice {
    pub fn new(manager: Arc<Songbird>, player: Arc<SongbirdPlayer>) -> Self {
        Self { manager, player }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdVoice {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> CommandResult {
        let call = self
            .manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        self.player.attach(call).await?;
        info!("Joined voice channel {} in guild {}", channel_id, guild_id);

        Ok(())
    }
}
