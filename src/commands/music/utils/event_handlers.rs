use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serenity::async_trait;
use songbird::tracks::PlayMode;
use songbird::{Event, EventContext, TrackEvent};
use tracing::debug;

use super::scheduler::{LifecycleSink, PlayerEvent};

/// Forwards one kind of songbird track event to the scheduler.
pub struct LifecycleNotifier {
    kind: TrackEvent,
    events: LifecycleSink,
    armed: Arc<AtomicBool>,
}

impl LifecycleNotifier {
    pub fn new(kind: TrackEvent, events: LifecycleSink, armed: Arc<AtomicBool>) -> Self {
        Self {
            kind,
            events,
            armed,
        }
    }
}

#[async_trait]
impl songbird::EventHandler for LifecycleNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        // Disarmed tracks were stopped by the player itself, not by the engine.
        if !self.armed.load(Ordering::Acquire) {
            return Some(Event::Cancel);
        }

        let EventContext::Track(tracks) = ctx else {
            return None;
        };

        let failure = tracks.first().and_then(|(state, _)| match &state.playing {
            PlayMode::Errored(error) => Some(format!("{error:?}")),
            _ => None,
        });

        let event = player_event(self.kind, failure)?;
        debug!(
            "Track event {:?} for playback {}",
            self.kind,
            self.events.playback()
        );

        if self.events.emit(event) {
            None
        } else {
            Some(Event::Cancel)
        }
    }
}

/// Map a songbird track event onto the scheduler's lifecycle vocabulary.
pub fn player_event(kind: TrackEvent, failure: Option<String>) -> Option<PlayerEvent> {
    match kind {
        TrackEvent::Playable => Some(PlayerEvent::Started),
        TrackEvent::Pause => Some(PlayerEvent::Paused),
        TrackEvent::Play => Some(PlayerEvent::Resumed),
        TrackEvent::End => Some(PlayerEvent::Ended),
        TrackEvent::Error => Some(PlayerEvent::Failed(
            failure.unwrap_or_else(|| "unknown playback error".to_string()),
        )),
        _ => None,
    }
}
