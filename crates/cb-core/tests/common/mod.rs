//! In-memory messenger that records every call

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use cb_core::{ActorId, Anchor, Messenger, Reactor, TransportError, View};

pub const BOT_ID: ActorId = ActorId(999);
pub const CHANNEL: u64 = 1385795977600045217;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Post(u64, View),
    Edit(Anchor, View),
    RemoveControls(Anchor),
    FollowUp(Anchor, View),
    AddReaction(Anchor, String),
    ReactionCount(Anchor),
    ListReactors(Anchor),
    Delete(Anchor),
}

#[derive(Default)]
pub struct RecordingMessenger {
    next_message_id: AtomicU64,
    reactors: Mutex<Vec<Reactor>>,
    reject_markers: bool,
    reaction_failure: Option<TransportError>,
    count_failure: Option<TransportError>,
    missing: Mutex<HashSet<u64>>,
    count_gate: Option<Arc<Barrier>>,
    edit_gate: Option<Arc<Barrier>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(100),
            ..Default::default()
        }
    }

    /// Every `add_reaction` fails as an invalid glyph
    pub fn rejecting_markers() -> Self {
        Self {
            reject_markers: true,
            ..Self::new()
        }
    }

    /// Every `add_reaction` fails with `error`
    pub fn failing_reactions(error: TransportError) -> Self {
        Self {
            reaction_failure: Some(error),
            ..Self::new()
        }
    }

    /// Every `reaction_count` fails with `error`
    pub fn failing_counts(error: TransportError) -> Self {
        Self {
            count_failure: Some(error),
            ..Self::new()
        }
    }

    /// `edit_message` meets `gate` twice: once on arrival, once before returning
    pub fn gated_edits(gate: Arc<Barrier>) -> Self {
        Self {
            edit_gate: Some(gate),
            ..Self::new()
        }
    }

    /// `reaction_count` waits on `gate` before answering
    pub fn gated(gate: Arc<Barrier>) -> Self {
        Self {
            count_gate: Some(gate),
            ..Self::new()
        }
    }

    /// A user reacts with the marker
    pub fn react(&self, id: ActorId, is_bot: bool) {
        self.reactors.lock().unwrap().push(Reactor { id, is_bot });
    }

    /// Make a message behave as if it was deleted by someone else
    pub fn forget(&self, message_id: u64) {
        self.missing.lock().unwrap().insert(message_id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn posts(&self) -> usize {
        self.count(|call| matches!(call, Call::Post(..)))
    }

    pub fn list_reactor_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::ListReactors(_)))
    }

    /// Edits or follow-ups announcing how a raffle ended
    pub fn announcements(&self) -> Vec<View> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit(_, view) | Call::FollowUp(_, view) if is_terminal_view(&view) => {
                    Some(view)
                }
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_exists(&self, anchor: Anchor) -> Result<(), TransportError> {
        if self.missing.lock().unwrap().contains(&anchor.message_id) {
            return Err(TransportError::NotFound);
        }
        Ok(())
    }
}

pub fn is_terminal_view(view: &View) -> bool {
    matches!(
        view,
        View::RaffleWinner { .. } | View::RaffleNoParticipants { .. } | View::RaffleCancelled { .. }
    )
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn post_message(&self, channel_id: u64, view: View) -> Result<Anchor, TransportError> {
        self.record(Call::Post(channel_id, view));
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        Ok(Anchor::new(channel_id, id))
    }

    async fn edit_message(&self, anchor: Anchor, view: View) -> Result<(), TransportError> {
        self.record(Call::Edit(anchor, view));
        if let Some(gate) = &self.edit_gate {
            gate.wait().await;
            gate.wait().await;
        }
        self.check_exists(anchor)
    }

    async fn remove_controls(&self, anchor: Anchor) -> Result<(), TransportError> {
        self.record(Call::RemoveControls(anchor));
        self.check_exists(anchor)
    }

    async fn follow_up(&self, anchor: Anchor, view: View) -> Result<Anchor, TransportError> {
        self.record(Call::FollowUp(anchor, view));
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        Ok(Anchor::new(anchor.channel_id, id))
    }

    async fn add_reaction(&self, anchor: Anchor, marker: &str) -> Result<(), TransportError> {
        self.record(Call::AddReaction(anchor, marker.to_string()));
        if self.reject_markers {
            return Err(TransportError::MarkerRejected(marker.to_string()));
        }
        if let Some(error) = &self.reaction_failure {
            return Err(error.clone());
        }
        self.react(BOT_ID, true);
        Ok(())
    }

    async fn reaction_count(&self, anchor: Anchor, _marker: &str) -> Result<u64, TransportError> {
        self.record(Call::ReactionCount(anchor));
        if let Some(gate) = &self.count_gate {
            gate.wait().await;
        }
        if let Some(error) = &self.count_failure {
            return Err(error.clone());
        }
        Ok(self.reactors.lock().unwrap().len() as u64)
    }

    async fn list_reactors(
        &self,
        anchor: Anchor,
        _marker: &str,
    ) -> Result<Vec<Reactor>, TransportError> {
        self.record(Call::ListReactors(anchor));
        Ok(self.reactors.lock().unwrap().clone())
    }

    async fn delete_message(&self, anchor: Anchor) -> Result<(), TransportError> {
        self.record(Call::Delete(anchor));
        self.check_exists(anchor)?;
        self.missing.lock().unwrap().insert(anchor.message_id);
        Ok(())
    }
}
