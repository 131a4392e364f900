//! Mock implementations for external dependencies
//! This module contains mock and fake collaborators used for testing

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jukebot::commands::music::utils::audio_sources::{LoadOutcome, LoadRequest, Track, TrackResolver};
use jukebot::commands::music::utils::music_manager::{MusicError, MusicResult};
use jukebot::commands::music::utils::scheduler::{AudioPlayer, LifecycleSink, PlayerEvent};
use jukebot::{ChatGateway, CommandResult, Error, VoiceTransport};
use mockall::mock;
use serenity::all::{ChannelId, GuildId, UserId};

use super::fixtures;

mock! {
    pub Gateway {}

    #[async_trait]
    impl ChatGateway for Gateway {
        async fn send_message(&self, channel_id: ChannelId, text: &str) -> CommandResult;

        async fn voice_channel_of(
            &self,
            guild_id: GuildId,
            user_id: UserId,
        ) -> Result<Option<ChannelId>, Error>;
    }
}

mock! {
    pub Voice {}

    #[async_trait]
    impl VoiceTransport for Voice {
        async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> CommandResult;
    }
}

/// Gateway fake that records replies and answers voice lookups after a delay.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(ChannelId, String)>>,
    pub voice_channel: Option<ChannelId>,
    pub lookup_delay: Duration,
}

impl RecordingGateway {
    pub fn replies(&self) -> Vec<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter().map(|(_, text)| text.clone()).collect()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> CommandResult {
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(())
    }

    async fn voice_channel_of(
        &self,
        _guild_id: GuildId,
        _user_id: UserId,
    ) -> Result<Option<ChannelId>, Error> {
        tokio::time::sleep(self.lookup_delay).await;
        Ok(self.voice_channel)
    }
}

/// Player fake that records every hand-over and lets tests drive lifecycle events.
#[derive(Default)]
pub struct FakePlayer {
    plays: Mutex<Vec<(Track, LifecycleSink)>>,
}

impl FakePlayer {
    pub fn titles(&self) -> Vec<String> {
        let plays = self.plays.lock().unwrap();
        plays.iter().map(|(track, _)| track.title.clone()).collect()
    }

    /// Report the most recently started track as finished.
    pub fn finish_current(&self) -> bool {
        let sink = self.plays.lock().unwrap().last().map(|(_, sink)| sink.clone());
        sink.is_some_and(|sink| sink.emit(PlayerEvent::Ended))
    }
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn play(&self, track: Track, events: LifecycleSink) -> MusicResult<()> {
        self.plays.lock().unwrap().push((track, events));
        Ok(())
    }

    async fn stop(&self) {}
}

/// Resolver fake: every source resolves to `fixtures::track(source)` after its
/// configured delay. Records the order in which requests reached it.
#[derive(Default)]
pub struct FakeResolver {
    delays: HashMap<String, Duration>,
    received: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn with_delays(delays: impl IntoIterator<Item = (String, Duration)>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, request: &LoadRequest) -> Result<LoadOutcome, MusicError> {
        self.received.lock().unwrap().push(request.source().to_string());
        let delay = self.delays.get(request.source()).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Ok(LoadOutcome::Track(fixtures::track(request.source())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_mock_gateway() {
        let mut mock = MockGateway::new();

        mock.expect_voice_channel_of()
            .with(eq(fixtures::guild()), eq(fixtures::user()))
            .times(1)
            .returning(|_, _| Ok(Some(fixtures::voice_channel())));

        let channel = mock
            .voice_channel_of(fixtures::guild(), fixtures::user())
            .await
            .unwrap();
        assert_eq!(channel, Some(fixtures::voice_channel()));
    }
}
