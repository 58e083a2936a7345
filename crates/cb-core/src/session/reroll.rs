//! Dice roll with a shared "roll again" control

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::Result;
use crate::draw::{DiceSpec, RandomDraw, RollResult};
use crate::session::state::{Lifecycle, SessionState};
use crate::session::{SessionId, log_ui_failure};
use crate::transport::{Anchor, Messenger, View};

/// A posted roll that anyone may re-roll until it expires.
///
/// Lifecycle is `Active -> Expired`; rerolling never ends the session.
#[derive(Debug)]
pub struct RerollSession {
    id: SessionId,
    spec: DiceSpec,
    anchor: Anchor,
    window: Duration,
    lifecycle: Lifecycle,
    ui: Mutex<()>,
}

impl RerollSession {
    /// Parse `notation`, roll once and publish the result with a reroll control.
    ///
    /// Nothing is posted when the notation is invalid.
    pub async fn create(
        id: SessionId,
        notation: &str,
        channel_id: u64,
        rolled_by: &str,
        window: Duration,
        messenger: &dyn Messenger,
        draw: &RandomDraw,
    ) -> Result<(Self, RollResult)> {
        let spec: DiceSpec = notation.parse()?;
        let result = draw.roll_dice(&spec);

        let view = View::Roll {
            session: id,
            spec,
            result: result.clone(),
            rolled_by: rolled_by.to_string(),
            reroll: true,
        };
        let anchor = messenger.post_message(channel_id, view).await?;

        info!(session = %id, dice = %spec, total = result.total, "Roll session opened");

        let session = Self {
            id,
            spec,
            anchor,
            window,
            lifecycle: Lifecycle::new(),
            ui: Mutex::new(()),
        };
        Ok((session, result))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn spec(&self) -> DiceSpec {
        self.spec
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.lifecycle.finished_at()
    }

    /// Roll the stored dice again and refresh the anchor
    pub async fn reroll(
        &self,
        rolled_by: &str,
        messenger: &dyn Messenger,
        draw: &RandomDraw,
    ) -> Result<RollResult> {
        self.lifecycle.ensure_active()?;

        // Round-trip through the canonical notation before every roll
        let spec: DiceSpec = self.spec.to_string().parse()?;
        let result = draw.roll_dice(&spec);

        let _ui = self.ui.lock().await;
        // Expiry may have stripped the control while we waited for the lock
        self.lifecycle.ensure_active()?;

        let view = View::Roll {
            session: self.id,
            spec,
            result: result.clone(),
            rolled_by: rolled_by.to_string(),
            reroll: true,
        };
        if let Err(e) = messenger.edit_message(self.anchor, view).await {
            log_ui_failure(self.id, "reroll", &e);
        }

        debug!(session = %self.id, total = result.total, "Rerolled");
        Ok(result)
    }

    /// Expire the session and strip the reroll control
    pub async fn on_expiry(&self, messenger: &dyn Messenger) -> Result<()> {
        self.lifecycle.finish(SessionState::Expired)?;

        let _ui = self.ui.lock().await;
        if let Err(e) = messenger.remove_controls(self.anchor).await {
            log_ui_failure(self.id, "expire", &e);
        }

        info!(session = %self.id, "Roll session expired");
        Ok(())
    }
}
