use std::env;

use thiserror::Error;

/// Environment variable consulted when no token is passed on the command line.
pub const TOKEN_VAR: &str = "DISCORD_TOKEN";

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "jukebot=debug,warn";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing Discord token: pass it as the first argument or set {TOKEN_VAR}")]
    MissingToken,
}

/// Startup configuration for the bot process.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub token: String,
}

impl Config {
    /// Build the configuration from process arguments (program name first),
    /// falling back to the environment for the token.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let from_args = args.into_iter().nth(1);
        Self::resolve(from_args, env::var(TOKEN_VAR).ok())
    }

    fn resolve(from_args: Option<String>, from_env: Option<String>) -> Result<Self, ConfigError> {
        let token = from_args
            .filter(|token| !token.trim().is_empty())
            .or_else(|| from_env.filter(|token| !token.trim().is_empty()))
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token: token.trim().to_string(),
        })
    }

    /// The `tracing` filter directive to install at startup.
    pub fn log_filter() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
    }
}
