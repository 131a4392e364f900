use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::gateway::InboundMessage;

/// Pushes every created message onto the dispatcher's event stream.
/// No command logic runs on the gateway's callback.
pub struct Handler {
    events: mpsc::UnboundedSender<InboundMessage>,
}

impl Handler {
    pub fn new(events: mpsc::UnboundedSender<InboundMessage>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, message: Message) {
        if self.events.send(InboundMessage::from(&message)).is_err() {
            warn!("Dispatcher is gone, dropping message {}", message.id);
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }
}
