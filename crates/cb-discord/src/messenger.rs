//! Serenity implementation of the session messaging boundary

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{
    self as serenity, ChannelId, CreateMessage, EditMessage, Http, MessageId, ReactionType, UserId,
};
use tracing::debug;

use cb_core::{ActorId, Anchor, Messenger, Reactor, TransportError, View};

use crate::render::render;

/// Discord caps reaction user pages at 100
const REACTORS_PAGE: u8 = 100;

pub struct SerenityMessenger {
    http: Arc<Http>,
}

impl SerenityMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn ids(anchor: Anchor) -> (ChannelId, MessageId) {
    (
        ChannelId::new(anchor.channel_id),
        MessageId::new(anchor.message_id),
    )
}

fn status(err: &serenity::Error) -> Option<u16> {
    match err {
        serenity::Error::Http(http_err) => http_err.status_code().map(|status| status.as_u16()),
        _ => None,
    }
}

fn classify(err: serenity::Error) -> TransportError {
    match status(&err) {
        Some(404) => TransportError::NotFound,
        Some(403) => TransportError::Forbidden,
        _ => TransportError::Other(err.to_string()),
    }
}

/// Unknown emoji comes back as a 400, missing permission as a 403
fn rejects_marker(status: Option<u16>) -> bool {
    matches!(status, Some(400) | Some(403))
}

fn parse_marker(marker: &str) -> Result<ReactionType, TransportError> {
    ReactionType::try_from(marker).map_err(|_| TransportError::MarkerRejected(marker.to_string()))
}

fn same_marker(a: &ReactionType, b: &ReactionType) -> bool {
    match (a, b) {
        (ReactionType::Custom { id: a, .. }, ReactionType::Custom { id: b, .. }) => a == b,
        (ReactionType::Unicode(a), ReactionType::Unicode(b)) => a == b,
        _ => false,
    }
}

#[async_trait]
impl Messenger for SerenityMessenger {
    async fn post_message(&self, channel_id: u64, view: View) -> Result<Anchor, TransportError> {
        let message = ChannelId::new(channel_id)
            .send_message(&self.http, render(&view).into_create_message())
            .await
            .map_err(classify)?;
        Ok(Anchor::new(channel_id, message.id.get()))
    }

    async fn edit_message(&self, anchor: Anchor, view: View) -> Result<(), TransportError> {
        let (channel, message) = ids(anchor);
        channel
            .edit_message(&self.http, message, render(&view).into_edit_message())
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn remove_controls(&self, anchor: Anchor) -> Result<(), TransportError> {
        let (channel, message) = ids(anchor);
        channel
            .edit_message(&self.http, message, EditMessage::new().components(Vec::new()))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn follow_up(&self, anchor: Anchor, view: View) -> Result<Anchor, TransportError> {
        let (channel, message) = ids(anchor);
        let builder: CreateMessage = render(&view)
            .into_create_message()
            .reference_message((channel, message));
        let sent = channel
            .send_message(&self.http, builder)
            .await
            .map_err(classify)?;
        Ok(Anchor::new(anchor.channel_id, sent.id.get()))
    }

    async fn add_reaction(&self, anchor: Anchor, marker: &str) -> Result<(), TransportError> {
        let (channel, message) = ids(anchor);
        let reaction = parse_marker(marker)?;
        channel
            .create_reaction(&self.http, message, reaction)
            .await
            .map_err(|e| {
                if rejects_marker(status(&e)) {
                    TransportError::MarkerRejected(marker.to_string())
                } else {
                    classify(e)
                }
            })
    }

    async fn reaction_count(&self, anchor: Anchor, marker: &str) -> Result<u64, TransportError> {
        let (channel, message) = ids(anchor);
        let reaction = parse_marker(marker)?;
        let message = channel
            .message(&self.http, message)
            .await
            .map_err(classify)?;

        let count = message
            .reactions
            .iter()
            .find(|r| same_marker(&r.reaction_type, &reaction))
            .map(|r| r.count)
            .unwrap_or(0);
        debug!(message = anchor.message_id, marker, count, "Fetched reaction count");
        Ok(count)
    }

    async fn list_reactors(
        &self,
        anchor: Anchor,
        marker: &str,
    ) -> Result<Vec<Reactor>, TransportError> {
        let (channel, message) = ids(anchor);
        let reaction = parse_marker(marker)?;

        let mut reactors = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = channel
                .reaction_users(
                    &self.http,
                    message,
                    reaction.clone(),
                    Some(REACTORS_PAGE),
                    after,
                )
                .await
                .map_err(classify)?;

            let full = page.len() == usize::from(REACTORS_PAGE);
            after = page.last().map(|user| user.id);
            reactors.extend(page.into_iter().map(|user| Reactor {
                id: ActorId(user.id.get()),
                is_bot: user.bot,
            }));

            if !full {
                break;
            }
        }

        Ok(reactors)
    }

    async fn delete_message(&self, anchor: Anchor) -> Result<(), TransportError> {
        let (channel, message) = ids(anchor);
        channel
            .delete_message(&self.http, message)
            .await
            .map_err(classify)
    }
}
