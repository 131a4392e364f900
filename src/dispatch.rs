//! Matching chat messages to commands and running them off the event loop.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::{Command, CommandContext, Services};
use crate::gateway::InboundMessage;

/// Prefix that marks a message as a command.
pub const TRIGGER: char = '!';

/// Errors raised while building the command table at startup.
#[derive(Error, Debug, PartialEq)]
pub enum DispatchError {
    #[error("Command keyword must not be empty")]
    EmptyKeyword,

    #[error("Command keyword '{0}' contains whitespace")]
    InvalidKeyword(String),

    #[error("Command keyword '{0}' is registered twice")]
    DuplicateKeyword(String),
}

/// Read-only mapping from `!keyword` prefixes to handlers.
pub struct CommandTable {
    entries: Vec<(String, Arc<dyn Command>)>,
}

impl CommandTable {
    pub fn new(commands: Vec<Arc<dyn Command>>) -> Result<Self, DispatchError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(commands.len());

        for command in commands {
            let keyword = command.keyword();
            if keyword.is_empty() {
                return Err(DispatchError::EmptyKeyword);
            }
            if keyword.chars().any(char::is_whitespace) {
                return Err(DispatchError::InvalidKeyword(keyword.to_string()));
            }
            if !seen.insert(keyword) {
                return Err(DispatchError::DuplicateKeyword(keyword.to_string()));
            }
            entries.push((format!("{TRIGGER}{keyword}"), command));
        }

        Ok(Self { entries })
    }

    /// The command whose `!keyword` prefixes `content`, provided exactly one
    /// does. Several matches (e.g. `play` and `playlist` for `!playlist`)
    /// count as no match at all.
    pub fn lookup(&self, content: &str) -> Option<Arc<dyn Command>> {
        let mut matches = self
            .entries
            .iter()
            .filter(|(prefix, _)| content.starts_with(prefix.as_str()));

        let (_, command) = matches.next()?;
        if matches.next().is_some() {
            debug!("Ambiguous command in message: {}", content);
            return None;
        }

        Some(Arc::clone(command))
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(prefix, _)| &prefix[TRIGGER.len_utf8()..])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Routes inbound messages to their command, one spawned task per command.
pub struct Dispatcher {
    table: Arc<CommandTable>,
    services: Services,
}

impl Dispatcher {
    pub fn new(table: CommandTable, services: Services) -> Self {
        Self {
            table: Arc::new(table),
            services,
        }
    }

    /// Start the handler for `message`, if it names exactly one command.
    ///
    /// The handler runs on its own task; the returned handle is only useful
    /// to callers that want to wait for it.
    pub fn dispatch(&self, message: InboundMessage) -> Option<JoinHandle<()>> {
        let content = message.content.as_deref()?;
        if !content.starts_with(TRIGGER) {
            return None;
        }

        let command = self.table.lookup(content)?;
        let keyword = command.keyword();
        debug!("Dispatching {}{} from user {}", TRIGGER, keyword, message.author_id);

        let ctx = CommandContext::new(message, self.services.clone());
        Some(tokio::spawn(async move {
            if let Err(err) = command.execute(ctx).await {
                warn!("Command {}{} failed: {}", TRIGGER, keyword, err);
            }
        }))
    }

    /// Drain the event stream until the gateway side hangs up.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<InboundMessage>) {
        info!(
            "Dispatching commands: {}",
            self.table.keywords().collect::<Vec<_>>().join(", ")
        );

        while let Some(message) = events.recv().await {
            self.dispatch(message);
        }

        info!("Event stream closed, dispatcher stopping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandResult;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serenity::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Command for Named {
        fn keyword(&self) -> &'static str {
            self.0
        }

        async fn execute(&self, _ctx: CommandContext) -> CommandResult {
            Ok(())
        }
    }

    fn table(keywords: &[&'static str]) -> CommandTable {
        CommandTable::new(
            keywords
                .iter()
                .map(|&keyword| Arc::new(Named(keyword)) as Arc<dyn Command>)
                .collect(),
        )
        .unwrap()
    }

    fn matched(table: &CommandTable, content: &str) -> Option<&'static str> {
        table.lookup(content).map(|command| command.keyword())
    }

    #[rstest]
    #[case("!play http://x", Some("play"))]
    #[case("!ping", Some("ping"))]
    #[case("!pingpong", Some("ping"))]
    #[case("!join now", Some("join"))]
    #[case("!PING", None)]
    #[case("ping", None)]
    #[case(" !ping", None)]
    #[case("!", None)]
    #[case("", None)]
    fn matches_by_prefix(#[case] content: &str, #[case] expected: Option<&'static str>) {
        let table = table(&["ping", "join", "play"]);
        assert_eq!(matched(&table, content), expected);
    }

    #[test]
    fn overlapping_keywords_are_ambiguous() {
        let both = table(&["play", "playlist"]);
        assert_eq!(matched(&both, "!playlist foo"), None);
        assert_eq!(matched(&both, "!play foo"), Some("play"));

        let only_playlist = table(&["playlist"]);
        assert_eq!(matched(&only_playlist, "!playlist foo"), Some("playlist"));
    }

    #[test]
    fn rejects_bad_tables() {
        let build = |keywords: &[&'static str]| {
            CommandTable::new(
                keywords
                    .iter()
                    .map(|&keyword| Arc::new(Named(keyword)) as Arc<dyn Command>)
                    .collect(),
            )
            .err()
        };

        assert_eq!(build(&["ping", "ping"]), Some(DispatchError::DuplicateKeyword("ping".into())));
        assert_eq!(build(&[""]), Some(DispatchError::EmptyKeyword));
        assert_eq!(build(&["two words"]), Some(DispatchError::InvalidKeyword("two words".into())));
        assert_eq!(build(&["ping", "join"]), None);
    }

    #[test]
    fn lists_keywords_in_registration_order() {
        let table = table(&["ping", "join", "play"]);
        assert_eq!(table.keywords().collect::<Vec<_>>(), vec!["ping", "join", "play"]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
    }
}
