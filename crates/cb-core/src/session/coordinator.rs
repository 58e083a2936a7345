//! Session registry, countdowns and action dispatch

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::draw::{RandomDraw, RollResult};
use crate::session::clock::SessionClock;
use crate::session::raffle::{RaffleOutcome, RaffleSession, RaffleSpec};
use crate::session::reroll::RerollSession;
use crate::session::state::SessionState;
use crate::session::{SessionId, new_session_id};
use crate::transport::{ActorId, Messenger};
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum SessionEntry {
    Reroll(Arc<RerollSession>),
    Raffle(Arc<RaffleSession>),
}

impl SessionEntry {
    fn state(&self) -> SessionState {
        match self {
            Self::Reroll(session) => session.state(),
            Self::Raffle(session) => session.state(),
        }
    }

    fn finished_at(&self) -> Option<Instant> {
        match self {
            Self::Reroll(session) => session.finished_at(),
            Self::Raffle(session) => session.finished_at(),
        }
    }
}

/// Owns every live session and its countdown.
///
/// Button clicks arrive as `(session_id, actor)` calls; clock fires arrive
/// as [`SessionCoordinator::expire`]. Whichever terminal transition lands
/// first is the only one announced.
pub struct SessionCoordinator {
    messenger: Arc<dyn Messenger>,
    draw: RandomDraw,
    config: SessionConfig,
    sessions: DashMap<SessionId, SessionEntry>,
    clocks: DashMap<SessionId, SessionClock>,
}

impl SessionCoordinator {
    pub fn new(messenger: Arc<dyn Messenger>, config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            messenger,
            draw: RandomDraw::new(),
            config,
            sessions: DashMap::new(),
            clocks: DashMap::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Roll `notation` in a channel and open a reroll session for it
    pub async fn start_roll(
        self: &Arc<Self>,
        channel_id: u64,
        notation: &str,
        rolled_by: &str,
    ) -> Result<(SessionId, RollResult)> {
        self.sweep_finished();

        let id = new_session_id();
        let window = Duration::from_secs(self.config.reroll_window_secs);
        let (session, result) = RerollSession::create(
            id,
            notation,
            channel_id,
            rolled_by,
            window,
            self.messenger.as_ref(),
            &self.draw,
        )
        .await?;

        self.sessions
            .insert(id, SessionEntry::Reroll(Arc::new(session)));
        self.start_clock(id, window);
        Ok((id, result))
    }

    /// Reroll action; open to any actor
    pub async fn reroll(&self, id: SessionId, rolled_by: &str) -> Result<RollResult> {
        let session = match self.entry(id)? {
            SessionEntry::Reroll(session) => session,
            SessionEntry::Raffle(_) => return Err(Error::SessionNotFound(id.to_string())),
        };
        session
            .reroll(rolled_by, self.messenger.as_ref(), &self.draw)
            .await
    }

    /// Open a raffle in a channel
    pub async fn start_raffle(self: &Arc<Self>, channel_id: u64, spec: RaffleSpec) -> Result<SessionId> {
        self.sweep_finished();

        let id = new_session_id();
        let window = spec.window();
        let session = Arc::new(
            RaffleSession::create(id, spec, channel_id, self.messenger.as_ref()).await?,
        );

        // Registered before the buttons exist so no click can miss it
        self.sessions
            .insert(id, SessionEntry::Raffle(Arc::clone(&session)));
        session.attach_controls(self.messenger.as_ref()).await;
        self.start_clock(id, window);
        Ok(id)
    }

    /// Owner draw action
    pub async fn draw(&self, id: SessionId, actor: ActorId) -> Result<RaffleOutcome> {
        let session = self.raffle(id)?;
        let outcome = session
            .draw(actor, self.messenger.as_ref(), &self.draw)
            .await?;
        self.cancel_clock(id);
        Ok(outcome)
    }

    /// Owner cancel action
    pub async fn cancel(&self, id: SessionId, actor: ActorId) -> Result<RaffleOutcome> {
        let session = self.raffle(id)?;
        let outcome = session.cancel(actor, self.messenger.as_ref()).await?;
        self.cancel_clock(id);
        Ok(outcome)
    }

    /// Clock fire for a session; a no-op returning `SessionAlreadyFinished`
    /// when an action already ended it
    pub async fn expire(&self, id: SessionId) -> Result<()> {
        // The clock has done its job once we get here
        self.clocks.remove(&id);

        match self.entry(id)? {
            SessionEntry::Reroll(session) => session.on_expiry(self.messenger.as_ref()).await,
            SessionEntry::Raffle(session) => session
                .on_expiry(self.messenger.as_ref(), &self.draw)
                .await
                .map(|_| ()),
        }
    }

    /// Start the single-shot countdown that expires session `id`
    pub fn start_clock(self: &Arc<Self>, id: SessionId, window: Duration) {
        let coordinator = Arc::downgrade(self);
        let clock = SessionClock::start(window, async move {
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            match coordinator.expire(id).await {
                Ok(()) => {}
                Err(Error::SessionAlreadyFinished) => {
                    debug!(session = %id, "Clock fired after session finished");
                }
                Err(e) => warn!(session = %id, "Session expiry failed: {}", e),
            }
        });

        if let Some(previous) = self.clocks.insert(id, clock) {
            previous.cancel();
        }
    }

    /// Best-effort stop of a session's countdown; returns whether one was pending
    pub fn cancel_clock(&self, id: SessionId) -> bool {
        match self.clocks.remove(&id) {
            Some((_, clock)) => {
                clock.cancel();
                true
            }
            None => false,
        }
    }

    /// Current state of a registered session
    pub fn state(&self, id: SessionId) -> Option<SessionState> {
        self.sessions.get(&id).map(|entry| entry.state())
    }

    /// Number of sessions still accepting actions
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().state() == SessionState::Active)
            .count()
    }

    fn entry(&self, id: SessionId) -> Result<SessionEntry> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    fn raffle(&self, id: SessionId) -> Result<Arc<RaffleSession>> {
        match self.entry(id)? {
            SessionEntry::Raffle(session) => Ok(session),
            SessionEntry::Reroll(_) => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    /// Forget sessions that finished longer ago than the retention period
    fn sweep_finished(&self) {
        let retention = Duration::from_secs(self.config.finished_retention_secs);
        let now = Instant::now();
        let before = self.sessions.len();

        self.sessions.retain(|_, entry| {
            entry
                .finished_at()
                .is_none_or(|finished| now.duration_since(finished) < retention)
        });

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!("Swept {} finished sessions", removed);
        }
    }
}
