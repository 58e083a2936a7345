//! Error types (cb-discord)

use thiserror::Error;

/// cb-discord error type
#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("Discord token not set")]
    TokenNotSet,

    #[error(transparent)]
    Core(#[from] cb_core::Error),

    #[error("Serenity error: {0}")]
    SerenityError(#[from] serenity::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DiscordError>;
