//! cb-core: chobot core library
//!
//! Timed interactive sessions (dice reroll, reaction raffle), the
//! messaging boundary they talk to, announcement dedup and configuration.

pub mod announce;
pub mod config;
pub mod draw;
pub mod error;
pub mod poll;
pub mod session;
pub mod transport;

pub use announce::AnnouncementTracker;
pub use config::{Config, DiscordConfig, InviteConfig, SessionConfig};
pub use draw::{DiceSpec, RandomDraw, RollResult};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use session::{
    RaffleOutcome, RaffleSession, RaffleSpec, RerollSession, SessionCoordinator, SessionId,
    SessionState,
};
pub use transport::{ActorId, Anchor, Messenger, Reactor, View};
