//! Session lifecycle state

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Resolved,
    Expired,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    finished_at: Option<Instant>,
}

/// Holds a session's state; the only writer is [`Lifecycle::finish`].
///
/// The lock is never held across an await.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::Active,
                finished_at: None,
            }),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub(crate) fn finished_at(&self) -> Option<Instant> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finished_at
    }

    /// Fail with `SessionAlreadyFinished` unless still active
    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.state().is_terminal() {
            return Err(Error::SessionAlreadyFinished);
        }
        Ok(())
    }

    /// Move from `Active` to `terminal`; only the first caller succeeds
    pub(crate) fn finish(&self, terminal: SessionState) -> Result<()> {
        debug_assert!(terminal.is_terminal());

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state.is_terminal() {
            return Err(Error::SessionAlreadyFinished);
        }
        inner.state = terminal;
        inner.finished_at = Some(Instant::now());
        Ok(())
    }
}
