use serenity::async_trait;
use tracing::debug;

use crate::commands::{Command, CommandContext};
use crate::CommandResult;

/// Fixed reply sent by `!ping`.
pub const PONG: &str = "Pong!";

/// Ping the bot to check it is alive
pub struct Ping;

#[async_trait]
impl Command for Ping {
    fn keyword(&self) -> &'static str {
        "ping"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        debug!("Replying to ping in channel {}", ctx.message.channel_id);
        ctx.reply(PONG).await
    }
}
