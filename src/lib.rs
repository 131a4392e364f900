//! A small Discord music bot: text commands prefixed with `!` are dispatched
//! to handlers, and `!play` feeds a single global track scheduler.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod gateway;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type CommandResult = Result<(), Error>;

pub use commands::{Command, CommandContext, Services};
pub use dispatch::{CommandTable, DispatchError, Dispatcher, TRIGGER};
pub use gateway::{ChatGateway, InboundMessage, VoiceTransport};
