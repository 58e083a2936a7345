//! Error types for cb-core

use thiserror::Error;

use crate::transport::ActorId;

/// Failures reported by the messaging layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("message not found")]
    NotFound,

    #[error("missing permission")]
    Forbidden,

    #[error("marker rejected: {0}")]
    MarkerRejected(String),

    #[error("transport failure: {0}")]
    Other(String),
}

/// Main error type for cb-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid dice format: {0}")]
    InvalidDiceFormat(String),

    #[error("Dice out of range: {count}d{faces}")]
    DiceRangeExceeded { count: u64, faces: u64 },

    #[error("Window of {0}s is outside 5..=300")]
    WindowOutOfRange(u64),

    #[error("Poll needs 2 to 20 options, got {0}")]
    PollOptionCount(usize),

    #[error("Only {owner} may act on this session")]
    Unauthorized { owner: ActorId },

    #[error("Session already finished")]
    SessionAlreadyFinished,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Marker rejected: {0}")]
    MarkerRejected(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Participant pool is empty")]
    EmptyParticipantPool,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse error category, used to pick how a failure is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; reported back to the user, nothing mutated
    Validation,
    /// Actor is not allowed to perform the action
    Authorization,
    /// The session is gone or already terminal
    Lifecycle,
    /// The messaging layer failed
    Transport,
    /// Broken internal contract
    Contract,
    /// Startup configuration problem
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDiceFormat(_)
            | Self::DiceRangeExceeded { .. }
            | Self::WindowOutOfRange(_)
            | Self::PollOptionCount(_) => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::SessionAlreadyFinished | Self::SessionNotFound(_) => ErrorKind::Lifecycle,
            Self::MarkerRejected(_) | Self::Transport(_) => ErrorKind::Transport,
            Self::EmptyParticipantPool => ErrorKind::Contract,
            Self::Config(_) | Self::Io(_) | Self::Toml(_) => ErrorKind::Config,
        }
    }

    /// Text shown (ephemerally) to the user whose action failed
    pub fn user_notice(&self) -> String {
        match self {
            Self::InvalidDiceFormat(_) => "Invalid format. Use NdM, e.g. 4d6".to_string(),
            Self::DiceRangeExceeded { .. } => "Use up to 100 dice with up to 1000 sides.".to_string(),
            Self::WindowOutOfRange(_) => "Time must be between 5 and 300 seconds.".to_string(),
            Self::PollOptionCount(_) => {
                "Provide between 2 and 20 options, separated by commas.".to_string()
            }
            Self::Unauthorized { owner } => format!("Only {} can draw or cancel.", owner.mention()),
            Self::SessionAlreadyFinished | Self::SessionNotFound(_) => {
                "This session has already finished.".to_string()
            }
            Self::MarkerRejected(_) => "Invalid emoji or missing permission to use it.".to_string(),
            _ => "Something went wrong, please try again.".to_string(),
        }
    }
}

/// Result type alias for cb-core
pub type Result<T> = std::result::Result<T, Error>;
