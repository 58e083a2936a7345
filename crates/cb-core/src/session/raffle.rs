//! Reaction raffle: users react with a marker, the owner (or the clock) draws

use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::draw::RandomDraw;
use crate::error::TransportError;
use crate::session::guard::AuthorizationGuard;
use crate::session::state::{Lifecycle, SessionState};
use crate::session::{SessionId, log_ui_failure};
use crate::transport::{ActorId, Anchor, Messenger, View};
use crate::{Error, Result};

pub const MIN_WINDOW_SECS: u64 = 5;
pub const MAX_WINDOW_SECS: u64 = 300;

/// Parameters of a raffle, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleSpec {
    pub label: String,
    pub marker: String,
    pub window_secs: u64,
    pub owner: ActorId,
}

impl RaffleSpec {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WINDOW_SECS..=MAX_WINDOW_SECS).contains(&self.window_secs) {
            return Err(Error::WindowOutOfRange(self.window_secs));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaffleOutcome {
    Winner(ActorId),
    /// Nobody but the bot reacted; an expected end, not a failure
    NoParticipants,
    Cancelled,
}

#[derive(Debug)]
pub struct RaffleSession {
    id: SessionId,
    spec: RaffleSpec,
    anchor: Anchor,
    guard: AuthorizationGuard,
    lifecycle: Lifecycle,
    outcome: OnceLock<RaffleOutcome>,
    ui: Mutex<()>,
}

impl RaffleSession {
    /// Post the raffle message and decorate it with the marker.
    ///
    /// The message carries no controls yet; see [`RaffleSession::attach_controls`].
    /// When the marker is rejected no session exists.
    pub async fn create(
        id: SessionId,
        spec: RaffleSpec,
        channel_id: u64,
        messenger: &dyn Messenger,
    ) -> Result<Self> {
        spec.validate()?;

        let anchor = messenger
            .post_message(channel_id, open_view(id, &spec, false))
            .await?;

        if let Err(e) = messenger.add_reaction(anchor, &spec.marker).await {
            warn!(session = %id, marker = %spec.marker, "Raffle marker rejected: {}", e);
            return Err(match e {
                TransportError::MarkerRejected(_) | TransportError::Forbidden => {
                    Error::MarkerRejected(spec.marker.clone())
                }
                other => Error::Transport(other),
            });
        }

        info!(
            session = %id,
            label = %spec.label,
            window = spec.window_secs,
            owner = %spec.owner,
            "Raffle opened"
        );

        Ok(Self {
            id,
            guard: AuthorizationGuard::new(spec.owner),
            spec,
            anchor,
            lifecycle: Lifecycle::new(),
            outcome: OnceLock::new(),
            ui: Mutex::new(()),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn spec(&self) -> &RaffleSpec {
        &self.spec
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Final outcome, once a terminal state carried one
    pub fn outcome(&self) -> Option<RaffleOutcome> {
        self.outcome.get().copied()
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.lifecycle.finished_at()
    }

    /// Add the draw and cancel buttons once clicks can reach this session
    pub async fn attach_controls(&self, messenger: &dyn Messenger) {
        let _ui = self.ui.lock().await;
        if self.lifecycle.ensure_active().is_err() {
            return;
        }
        if let Err(e) = messenger
            .edit_message(self.anchor, open_view(self.id, &self.spec, true))
            .await
        {
            log_ui_failure(self.id, "attach controls", &e);
        }
    }

    /// Owner-only: pick a winner among the current reactors
    pub async fn draw(
        &self,
        actor: ActorId,
        messenger: &dyn Messenger,
        draw: &RandomDraw,
    ) -> Result<RaffleOutcome> {
        self.lifecycle.ensure_active()?;
        self.guard.check(actor)?;

        let outcome = self.tally(messenger, draw).await?;

        self.lifecycle.finish(SessionState::Resolved)?;
        self.record(outcome);

        info!(session = %self.id, outcome = ?outcome, "Raffle drawn");
        self.announce_in_place(outcome, messenger).await;
        Ok(outcome)
    }

    /// Owner-only: end the raffle without drawing
    pub async fn cancel(&self, actor: ActorId, messenger: &dyn Messenger) -> Result<RaffleOutcome> {
        self.lifecycle.ensure_active()?;
        self.guard.check(actor)?;

        self.lifecycle.finish(SessionState::Cancelled)?;
        let outcome = RaffleOutcome::Cancelled;
        self.record(outcome);

        info!(session = %self.id, "Raffle cancelled");
        self.announce_in_place(outcome, messenger).await;
        Ok(outcome)
    }

    /// Clock fire: resolve like `draw`, without authorization, via a follow-up
    pub async fn on_expiry(
        &self,
        messenger: &dyn Messenger,
        draw: &RandomDraw,
    ) -> Result<RaffleOutcome> {
        self.lifecycle.ensure_active()?;

        let tally = self.tally(messenger, draw).await;

        // Re-check after the reaction queries; a concurrent draw/cancel wins
        self.lifecycle.finish(SessionState::Expired)?;

        let outcome = match tally {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(session = %self.id, "Could not resolve expired raffle: {}", e);
                let _ui = self.ui.lock().await;
                if let Err(ui_err) = messenger.remove_controls(self.anchor).await {
                    log_ui_failure(self.id, "expire", &ui_err);
                }
                return Err(e);
            }
        };
        self.record(outcome);

        info!(session = %self.id, outcome = ?outcome, "Raffle expired");

        let _ui = self.ui.lock().await;
        if let Err(e) = messenger.remove_controls(self.anchor).await {
            log_ui_failure(self.id, "expire", &e);
        }
        if let Err(e) = messenger
            .follow_up(self.anchor, self.outcome_view(outcome))
            .await
        {
            log_ui_failure(self.id, "announce", &e);
        }

        Ok(outcome)
    }

    /// Count the marker and, when someone besides the bot reacted, pick a winner
    async fn tally(&self, messenger: &dyn Messenger, draw: &RandomDraw) -> Result<RaffleOutcome> {
        let count = messenger
            .reaction_count(self.anchor, &self.spec.marker)
            .await?;

        // The bot's own decoration accounts for one reaction
        if count <= 1 {
            return Ok(RaffleOutcome::NoParticipants);
        }

        let participants: Vec<ActorId> = messenger
            .list_reactors(self.anchor, &self.spec.marker)
            .await?
            .into_iter()
            .filter(|reactor| !reactor.is_bot)
            .map(|reactor| reactor.id)
            .collect();

        if participants.is_empty() {
            warn!(session = %self.id, count, "Only bots reacted to the raffle");
            return Ok(RaffleOutcome::NoParticipants);
        }

        Ok(RaffleOutcome::Winner(draw.choose_winner(&participants)?))
    }

    fn record(&self, outcome: RaffleOutcome) {
        // Only the winner of `Lifecycle::finish` gets here, so this is the first set
        let _ = self.outcome.set(outcome);
    }

    async fn announce_in_place(&self, outcome: RaffleOutcome, messenger: &dyn Messenger) {
        let _ui = self.ui.lock().await;
        if let Err(e) = messenger
            .edit_message(self.anchor, self.outcome_view(outcome))
            .await
        {
            log_ui_failure(self.id, "announce", &e);
        }
    }

    fn outcome_view(&self, outcome: RaffleOutcome) -> View {
        let label = self.spec.label.clone();
        match outcome {
            RaffleOutcome::Winner(winner) => View::RaffleWinner { label, winner },
            RaffleOutcome::NoParticipants => View::RaffleNoParticipants { label },
            RaffleOutcome::Cancelled => View::RaffleCancelled { label },
        }
    }
}

fn open_view(id: SessionId, spec: &RaffleSpec, controls: bool) -> View {
    View::RaffleOpen {
        session: id,
        label: spec.label.clone(),
        marker: spec.marker.clone(),
        window_secs: spec.window_secs,
        controls,
    }
}
