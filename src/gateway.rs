//! The narrow slice of the chat platform the command handlers depend on.
//!
//! Handlers only ever see [`InboundMessage`] values and the two traits below,
//! which keeps them independent of the serenity client and easy to mock.

use std::sync::Arc;

use serenity::all::{Cache, ChannelId, CreateMessage, GuildId, Http, Message, UserId};
use serenity::async_trait;

use crate::{CommandResult, Error};

/// A chat message as seen by the dispatch engine.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Message text; `None` when the platform delivered no content.
    pub content: Option<String>,
    pub channel_id: ChannelId,
    /// `None` for direct messages, which have no member or voice state.
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
}

impl InboundMessage {
    pub fn new(content: impl Into<String>, channel_id: ChannelId, author_id: UserId) -> Self {
        let content = content.into();
        Self {
            content: (!content.is_empty()).then_some(content),
            channel_id,
            guild_id: None,
            author_id,
        }
    }

    pub fn in_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    /// The whitespace-delimited token at `index`, where index 0 is the command itself.
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.content.as_deref()?.split_whitespace().nth(index)
    }
}

impl From<&Message> for InboundMessage {
    fn from(message: &Message) -> Self {
        let mut inbound = Self::new(message.content.clone(), message.channel_id, message.author.id);
        inbound.guild_id = message.guild_id;
        inbound
    }
}

/// Reply and voice-state lookups against the chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send a plain text message to a channel.
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> CommandResult;

    /// The voice channel a member is currently connected to, if any.
    async fn voice_channel_of(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<ChannelId>, Error>;
}

/// Attaches the bot's audio output to a voice channel.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> CommandResult;
}

/// [`ChatGateway`] backed by serenity's HTTP client and gateway cache.
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl ChatGateway for SerenityGateway {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> CommandResult {
        channel_id
            .send_message(&self.http, CreateMessage::new().content(text))
            .await?;
        Ok(())
    }

    async fn voice_channel_of(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<ChannelId>, Error> {
        // Voice states only arrive through the gateway, so the cache is authoritative.
        let channel = self.cache.guild(guild_id).and_then(|guild| {
            guild
                .voice_states
                .get(&user_id)
                .and_then(|state| state.channel_id)
        });
        Ok(channel)
    }
}
