use serenity::async_trait;
use tracing::debug;

use crate::commands::{Command, CommandContext};
use crate::CommandResult;

/// Join the voice channel the caller is currently in
pub struct Join;

#[async_trait]
impl Command for Join {
    fn keyword(&self) -> &'static str {
        "join"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let message = &ctx.message;

        let Some(guild_id) = message.guild_id else {
            debug!("Ignoring join outside of a guild");
            return Ok(());
        };

        let channel_id = match ctx
            .services
            .gateway
            .voice_channel_of(guild_id, message.author_id)
            .await?
        {
            Some(channel_id) => channel_id,
            None => {
                debug!("User {} is not in a voice channel", message.author_id);
                return Ok(());
            }
        };

        ctx.services.voice.join(guild_id, channel_id).await
    }
}
