//! Owner-only authorization for session actions

use tracing::debug;

use crate::transport::ActorId;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationGuard {
    owner: ActorId,
}

impl AuthorizationGuard {
    pub fn new(owner: ActorId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Allow only the session owner
    pub fn check(&self, actor: ActorId) -> Result<()> {
        if actor != self.owner {
            debug!(actor = %actor, owner = %self.owner, "Rejected action from non-owner");
            return Err(Error::Unauthorized { owner: self.owner });
        }
        Ok(())
    }
}
