//! Boundary between the session subsystem and the messaging layer

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::draw::{DiceSpec, RollResult};
use crate::error::TransportError;
use crate::session::SessionId;

/// Opaque user identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    /// Platform mention markup for this user
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the message a session decorates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub channel_id: u64,
    pub message_id: u64,
}

impl Anchor {
    pub fn new(channel_id: u64, message_id: u64) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

/// A user who reacted with a marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reactor {
    pub id: ActorId,
    pub is_bot: bool,
}

/// Semantic UI state of a session message; rendering is up to the messenger
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// A dice roll, optionally with the reroll control
    Roll {
        session: SessionId,
        spec: DiceSpec,
        result: RollResult,
        rolled_by: String,
        reroll: bool,
    },
    /// An open raffle, optionally with the draw/cancel controls
    RaffleOpen {
        session: SessionId,
        label: String,
        marker: String,
        window_secs: u64,
        controls: bool,
    },
    RaffleWinner {
        label: String,
        winner: ActorId,
    },
    RaffleNoParticipants {
        label: String,
    },
    RaffleCancelled {
        label: String,
    },
}

impl View {
    /// Whether this view carries interactive controls
    pub fn has_controls(&self) -> bool {
        match self {
            Self::Roll { reroll, .. } => *reroll,
            Self::RaffleOpen { controls, .. } => *controls,
            _ => false,
        }
    }
}

/// Operations the session subsystem needs from the messaging layer
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Publish a new message in a channel
    async fn post_message(&self, channel_id: u64, view: View) -> Result<Anchor, TransportError>;

    /// Replace the content of an existing message
    async fn edit_message(&self, anchor: Anchor, view: View) -> Result<(), TransportError>;

    /// Strip every interactive control from a message, keeping its content
    async fn remove_controls(&self, anchor: Anchor) -> Result<(), TransportError>;

    /// Publish a message that follows up on (replies to) an anchor
    async fn follow_up(&self, anchor: Anchor, view: View) -> Result<Anchor, TransportError>;

    async fn add_reaction(&self, anchor: Anchor, marker: &str) -> Result<(), TransportError>;

    /// Total reactions with `marker`, the bot's own decoration included
    async fn reaction_count(&self, anchor: Anchor, marker: &str) -> Result<u64, TransportError>;

    async fn list_reactors(&self, anchor: Anchor, marker: &str)
    -> Result<Vec<Reactor>, TransportError>;

    async fn delete_message(&self, anchor: Anchor) -> Result<(), TransportError>;
}
