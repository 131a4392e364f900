//! This module aggregates all the command modules for the bot.

use std::sync::Arc;

use serenity::async_trait;

use crate::dispatch::{CommandTable, DispatchError};
use crate::gateway::{ChatGateway, InboundMessage, VoiceTransport};
use crate::CommandResult;

use music::utils::scheduler::TrackScheduler;

/// General purpose commands (e.g., ping).
pub mod general;
/// Commands related to music playback.
pub mod music;

/// Handles to the collaborators every command may use.
#[derive(Clone)]
pub struct Services {
    pub gateway: Arc<dyn ChatGateway>,
    pub voice: Arc<dyn VoiceTransport>,
    pub scheduler: TrackScheduler,
}

/// Everything a handler needs for one invocation.
pub struct CommandContext {
    pub message: InboundMessage,
    pub services: Services,
}

impl CommandContext {
    pub fn new(message: InboundMessage, services: Services) -> Self {
        Self { message, services }
    }

    /// Reply in the channel the command came from.
    pub async fn reply(&self, text: &str) -> CommandResult {
        self.services
            .gateway
            .send_message(self.message.channel_id, text)
            .await
    }
}

/// A single chat command, registered once under a unique keyword.
#[async_trait]
pub trait Command: Send + Sync {
    /// The keyword that follows the trigger character, e.g. `ping` for `!ping`.
    fn keyword(&self) -> &'static str;

    async fn execute(&self, ctx: CommandContext) -> CommandResult;
}

/// The full command set of the bot.
pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(general::ping::Ping),
        Arc::new(music::join::Join),
        Arc::new(music::play::Play),
    ]
}

/// Build the startup command table.
pub fn table() -> Result<CommandTable, DispatchError> {
    CommandTable::new(all())
}
