//! Timed interactive sessions
//!
//! A session decorates one message (its [`Anchor`](crate::Anchor)), accepts
//! actions while `Active`, and reaches exactly one terminal state. The
//! terminal transition is a compare-and-set made after the last await of an
//! action and before anything is announced, so a losing concurrent action
//! observes the finished state and writes nothing.

pub mod clock;
pub mod coordinator;
pub mod guard;
pub mod raffle;
pub mod reroll;
pub mod state;

pub use clock::SessionClock;
pub use coordinator::SessionCoordinator;
pub use guard::AuthorizationGuard;
pub use raffle::{RaffleOutcome, RaffleSession, RaffleSpec};
pub use reroll::RerollSession;
pub use state::SessionState;

use tracing::{debug, warn};

use crate::error::TransportError;

/// Sessions are addressed by a random UUID embedded in their control ids
pub type SessionId = uuid::Uuid;

/// Generate a fresh session id
pub fn new_session_id() -> SessionId {
    uuid::Uuid::new_v4()
}

/// UI updates never change a session's outcome; failures are only logged.
fn log_ui_failure(session: SessionId, operation: &str, err: &TransportError) {
    match err {
        TransportError::NotFound => {
            debug!(session = %session, operation, "Session message already removed");
        }
        other => {
            warn!(session = %session, operation, "Failed to update session message: {}", other);
        }
    }
}
