//! The track scheduler: one task owns the queue and the player state.
//!
//! Every mutation arrives as a message on the scheduler's mailbox:
//! `enqueue` calls from command handlers, resolution results from the
//! resolver tasks it spawns, and lifecycle events posted by the player.
//! Handling them one at a time is what keeps the queue consistent while
//! several `!play` commands and playback callbacks race each other.
//!
//! State transitions:
//!
//! * `Idle` + enqueue → `Loading` (the request takes the active slot)
//! * `Loading`/`Playing` + enqueue → a position is reserved at the queue tail
//! * `Loading` + resolved → `Playing`; unplayable → next queued entry or `Idle`
//! * `Playing` + ended/failed → next queued entry or `Idle`
//!
//! When the queue head is still resolving at advance time the scheduler goes
//! back to `Loading` for it rather than skipping ahead.

use std::sync::Arc;

use serenity::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::audio_sources::{LoadOutcome, LoadRequest, Track, TrackResolver};
use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::{LoadTicket, QueueSlot, TrackQueue};

/// Identifies one hand-over of a track to the player.
pub type PlaybackId = u64;

/// Lifecycle notifications emitted by the audio engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Started,
    Paused,
    Resumed,
    Ended,
    Failed(String),
}

/// The externally visible player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// The audio engine the scheduler drives.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start `track`, replacing whatever was playing. Lifecycle events for
    /// this playback must be reported through `events`.
    async fn play(&self, track: Track, events: LifecycleSink) -> MusicResult<()>;

    async fn stop(&self);
}

/// Where the player reports lifecycle events for one playback.
///
/// Holds only a weak reference to the mailbox, so an engine that outlives
/// the scheduler does not keep it running.
#[derive(Clone)]
pub struct LifecycleSink {
    playback: PlaybackId,
    mailbox: mpsc::WeakUnboundedSender<SchedulerMessage>,
}

impl LifecycleSink {
    pub fn playback(&self) -> PlaybackId {
        self.playback
    }

    /// Post an event. Returns `false` once the scheduler is gone.
    pub fn emit(&self, event: PlayerEvent) -> bool {
        let Some(mailbox) = self.mailbox.upgrade() else {
            return false;
        };

        mailbox
            .send(SchedulerMessage::Lifecycle {
                playback: self.playback,
                event,
            })
            .is_ok()
    }
}

/// Receiving end of a sink created without a scheduler, for player tests.
#[cfg(test)]
pub(crate) struct LifecycleInbox {
    inbox: mpsc::UnboundedReceiver<SchedulerMessage>,
    _mailbox: mpsc::UnboundedSender<SchedulerMessage>,
}

#[cfg(test)]
impl LifecycleInbox {
    /// The next lifecycle event posted to the sink, if one is waiting.
    pub(crate) fn try_next(&mut self) -> Option<(PlaybackId, PlayerEvent)> {
        match self.inbox.try_recv().ok()? {
            SchedulerMessage::Lifecycle { playback, event } => Some((playback, event)),
            _ => None,
        }
    }
}

#[cfg(test)]
impl LifecycleSink {
    /// A sink over a live mailbox that nothing drains.
    pub(crate) fn detached(playback: PlaybackId) -> (Self, LifecycleInbox) {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let sink = Self {
            playback,
            mailbox: mailbox.downgrade(),
        };
        (
            sink,
            LifecycleInbox {
                inbox,
                _mailbox: mailbox,
            },
        )
    }

    /// A sink whose scheduler has already shut down.
    pub(crate) fn closed(playback: PlaybackId) -> Self {
        let (mailbox, _) = mpsc::unbounded_channel();
        Self {
            playback,
            mailbox: mailbox.downgrade(),
        }
    }
}

/// A queue position as reported by [`TrackScheduler::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedTrack {
    /// Still resolving; holds the raw source.
    Loading(String),
    Ready(Track),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSnapshot {
    pub state: PlayerState,
    /// Source being resolved for the active slot, while `Loading`.
    pub loading: Option<String>,
    pub current: Option<Track>,
    pub queued: Vec<QueuedTrack>,
}

enum SchedulerMessage {
    Enqueue(LoadRequest),
    Resolved {
        ticket: LoadTicket,
        outcome: MusicResult<LoadOutcome>,
    },
    Lifecycle {
        playback: PlaybackId,
        event: PlayerEvent,
    },
    Snapshot(oneshot::Sender<SchedulerSnapshot>),
}

/// Cloneable handle to the scheduler task.
#[derive(Clone)]
pub struct TrackScheduler {
    mailbox: mpsc::UnboundedSender<SchedulerMessage>,
}

impl TrackScheduler {
    /// Spawn the scheduler task on the current tokio runtime.
    pub fn spawn(player: Arc<dyn AudioPlayer>, resolver: Arc<dyn TrackResolver>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = SchedulerTask::new(player, resolver, tx.downgrade());
        tokio::spawn(task.run(rx));
        Self { mailbox: tx }
    }

    /// Submit a load request. Returns as soon as the request holds its place
    /// in line; resolution and playback continue in the background.
    pub fn enqueue(&self, request: LoadRequest) -> MusicResult<()> {
        self.mailbox
            .send(SchedulerMessage::Enqueue(request))
            .map_err(|_| MusicError::SchedulerClosed)
    }

    /// Current state, as of every message sent before this call.
    pub async fn snapshot(&self) -> MusicResult<SchedulerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.mailbox
            .send(SchedulerMessage::Snapshot(tx))
            .map_err(|_| MusicError::SchedulerClosed)?;
        rx.await.map_err(|_| MusicError::SchedulerClosed)
    }
}

enum Active {
    Idle,
    Loading {
        ticket: LoadTicket,
        source: String,
    },
    Playing {
        playback: PlaybackId,
        track: Track,
        paused: bool,
    },
}

struct SchedulerTask {
    player: Arc<dyn AudioPlayer>,
    resolver: Arc<dyn TrackResolver>,
    mailbox: mpsc::WeakUnboundedSender<SchedulerMessage>,
    queue: TrackQueue,
    active: Active,
    next_ticket: LoadTicket,
    next_playback: PlaybackId,
}

impl SchedulerTask {
    fn new(
        player: Arc<dyn AudioPlayer>,
        resolver: Arc<dyn TrackResolver>,
        mailbox: mpsc::WeakUnboundedSender<SchedulerMessage>,
    ) -> Self {
        Self {
            player,
            resolver,
            mailbox,
            queue: TrackQueue::new(),
            active: Active::Idle,
            next_ticket: 0,
            next_playback: 0,
        }
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<SchedulerMessage>) {
        while let Some(message) = inbox.recv().await {
            match message {
                SchedulerMessage::Enqueue(request) => self.enqueue(request),
                SchedulerMessage::Resolved { ticket, outcome } => {
                    self.resolved(ticket, outcome).await
                }
                SchedulerMessage::Lifecycle { playback, event } => {
                    self.lifecycle(playback, event).await
                }
                SchedulerMessage::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        debug!("Scheduler handles dropped, stopping player");
        self.player.stop().await;
    }

    fn enqueue(&mut self, request: LoadRequest) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        if matches!(self.active, Active::Idle) {
            info!("Loading '{}'", request);
            self.active = Active::Loading {
                ticket,
                source: request.source().to_string(),
            };
        } else {
            info!("Queueing '{}' at position {}", request, self.queue.len() + 1);
            self.queue.reserve(ticket, request.clone());
        }

        let resolver = Arc::clone(&self.resolver);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let outcome = resolver.resolve(&request).await;
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(SchedulerMessage::Resolved { ticket, outcome });
            }
        });
    }

    async fn resolved(&mut self, ticket: LoadTicket, outcome: MusicResult<LoadOutcome>) {
        let track = match outcome {
            Ok(outcome) => outcome.into_playable(),
            Err(err) => {
                warn!("Load request {} failed: {}", ticket, err);
                None
            }
        };

        if matches!(self.active, Active::Loading { ticket: loading, .. } if loading == ticket) {
            match track {
                Some(track) => {
                    if !self.start(track).await {
                        self.advance().await;
                    }
                }
                None => {
                    info!("Load request {} produced nothing playable", ticket);
                    self.advance().await;
                }
            }
            return;
        }

        match track {
            Some(track) => {
                if let Err(track) = self.queue.fulfil(ticket, track) {
                    warn!("No queue position for '{}' (request {})", track.title, ticket);
                }
            }
            None => match self.queue.discard(ticket) {
                Some(request) => info!("Dropped unplayable queued request '{}'", request),
                None => warn!("No queue position for failed request {}", ticket),
            },
        }
    }

    async fn lifecycle(&mut self, playback: PlaybackId, event: PlayerEvent) {
        let Active::Playing {
            playback: current,
            track,
            paused,
        } = &mut self.active
        else {
            debug!("Ignoring {:?} for playback {} while not playing", event, playback);
            return;
        };

        if *current != playback {
            debug!("Ignoring {:?} for stale playback {}", event, playback);
            return;
        }

        match event {
            PlayerEvent::Started | PlayerEvent::Resumed => *paused = false,
            PlayerEvent::Paused => *paused = true,
            PlayerEvent::Ended => {
                info!("Finished '{}'", track.title);
                self.advance().await;
            }
            PlayerEvent::Failed(reason) => {
                warn!("Playback of '{}' failed: {}", track.title, reason);
                self.advance().await;
            }
        }
    }

    /// Promote the queue head into the active slot, or go idle.
    async fn advance(&mut self) {
        while let Some(entry) = self.queue.pop_front() {
            match entry.slot {
                QueueSlot::Ready(track) => {
                    if self.start(track).await {
                        return;
                    }
                }
                QueueSlot::Pending(request) => {
                    info!("Waiting for '{}' to finish loading", request);
                    self.active = Active::Loading {
                        ticket: entry.ticket,
                        source: request.source().to_string(),
                    };
                    return;
                }
            }
        }

        if !matches!(self.active, Active::Idle) {
            info!("Queue finished, player is idle");
        }
        self.active = Active::Idle;
    }

    /// Hand `track` to the player. Returns `false` if the player refused it.
    async fn start(&mut self, track: Track) -> bool {
        let playback = self.next_playback;
        self.next_playback += 1;

        let events = LifecycleSink {
            playback,
            mailbox: self.mailbox.clone(),
        };

        match self.player.play(track.clone(), events).await {
            Ok(()) => {
                info!("Now playing '{}'", track.title);
                self.active = Active::Playing {
                    playback,
                    track,
                    paused: false,
                };
                true
            }
            Err(err) => {
                warn!("Player rejected '{}': {}", track.title, err);
                false
            }
        }
    }

    fn snapshot(&self) -> SchedulerSnapshot {
        let (state, loading, current) = match &self.active {
            Active::Idle => (PlayerState::Idle, None, None),
            Active::Loading { source, .. } => (PlayerState::Loading, Some(source.clone()), None),
            Active::Playing { track, paused, .. } => {
                let state = if *paused {
                    PlayerState::Paused
                } else {
                    PlayerState::Playing
                };
                (state, None, Some(track.clone()))
            }
        };

        let queued = self
            .queue
            .iter()
            .map(|entry| match &entry.slot {
                QueueSlot::Pending(request) => QueuedTrack::Loading(request.source().to_string()),
                QueueSlot::Ready(track) => QueuedTrack::Ready(track.clone()),
            })
            .collect();

        SchedulerSnapshot {
            state,
            loading,
            current,
            queued,
        }
    }
}
