//! Test fixtures for the bot
//! This module contains sample ids and messages used in tests

use jukebot::InboundMessage;
use jukebot::commands::music::utils::audio_sources::Track;
use serenity::all::{ChannelId, GuildId, UserId};

/// Sample user ID for testing
pub const SAMPLE_USER_ID: u64 = 123456789;

/// Sample text channel ID for testing
pub const SAMPLE_CHANNEL_ID: u64 = 987654321;

/// Sample voice channel ID for testing
pub const SAMPLE_VOICE_CHANNEL_ID: u64 = 555555555;

/// Sample guild ID for testing
pub const SAMPLE_GUILD_ID: u64 = 111111111;

pub fn channel() -> ChannelId {
    ChannelId::new(SAMPLE_CHANNEL_ID)
}

pub fn voice_channel() -> ChannelId {
    ChannelId::new(SAMPLE_VOICE_CHANNEL_ID)
}

pub fn guild() -> GuildId {
    GuildId::new(SAMPLE_GUILD_ID)
}

pub fn user() -> UserId {
    UserId::new(SAMPLE_USER_ID)
}

/// A guild message from the sample user in the sample channel.
pub fn message(content: &str) -> InboundMessage {
    InboundMessage::new(content, channel(), user()).in_guild(guild())
}

/// A direct message, which has no guild and therefore no voice state.
pub fn direct_message(content: &str) -> InboundMessage {
    InboundMessage::new(content, channel(), user())
}

/// The track the fake resolver produces for `source`.
pub fn track(source: &str) -> Track {
    Track::new(source, format!("https://example.com/{source}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data() {
        assert_eq!(message("!ping").guild_id, Some(guild()));
        assert_eq!(direct_message("!ping").guild_id, None);
        assert!(SAMPLE_USER_ID > 0);
        assert!(SAMPLE_CHANNEL_ID > 0);
    }
}
