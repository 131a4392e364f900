use serenity::async_trait;
use tracing::{debug, info};

use super::utils::audio_sources::LoadRequest;
use crate::commands::{Command, CommandContext};
use crate::CommandResult;

/// Play a song from a URL or search query
pub struct Play;

#[async_trait]
impl Command for Play {
    fn keyword(&self) -> &'static str {
        "play"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let Some(source) = ctx.message.argument(1) else {
            debug!("Ignoring play without a source");
            return Ok(());
        };

        info!("Received play command with source: {}", source);
        ctx.services.scheduler.enqueue(LoadRequest::new(source))?;

        Ok(())
    }
}
