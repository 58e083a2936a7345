//! Keep only the latest automated announcement visible
//!
//! The tracker remembers a single message: the most recent announcement
//! seen. It starts empty; each new announcement deletes the previous one
//! (best-effort) and takes its place.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::transport::{Anchor, Messenger};

#[derive(Debug, Default)]
pub struct AnnouncementTracker {
    last: Mutex<Option<Anchor>>,
}

impl AnnouncementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The announcement currently considered latest
    pub async fn latest(&self) -> Option<Anchor> {
        *self.last.lock().await
    }

    /// Record `anchor` as the latest announcement, deleting the one it supersedes.
    ///
    /// Returns the superseded anchor, if any. Deletion failures are logged and
    /// never prevent the replacement.
    pub async fn replace(&self, anchor: Anchor, messenger: &dyn Messenger) -> Option<Anchor> {
        // Held across the delete so two arrivals cannot both delete the same predecessor
        let mut last = self.last.lock().await;

        let previous = match *last {
            Some(previous) if previous != anchor => Some(previous),
            _ => None,
        };

        if let Some(previous) = previous {
            match messenger.delete_message(previous).await {
                Ok(()) => debug!(message = previous.message_id, "Deleted superseded announcement"),
                Err(TransportError::NotFound) => {
                    debug!(message = previous.message_id, "Superseded announcement already gone");
                }
                Err(e) => warn!("Failed to delete previous announcement: {}", e),
            }
        }

        *last = Some(anchor);
        previous
    }
}
