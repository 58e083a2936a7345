//! Discord event handler implementation using poise Framework

use poise::serenity_prelude::{
    self as serenity, ComponentInteraction, CreateInteractionResponse,
    CreateInteractionResponseFollowup, FullEvent, Interaction, Message, OnlineStatus,
};
use tracing::{debug, error, info, warn};

use cb_core::{ActorId, Anchor, ErrorKind};

use crate::commands::{Data, Error};
use crate::error::Result;
use crate::render::{ControlAction, parse_custom_id};

/// Entry point for every gateway event poise hands us
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<()> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("Bot connected as {}", data_about_bot.user.name);
            ctx.set_presence(None, OnlineStatus::DoNotDisturb);
        }
        FullEvent::Message { new_message } => {
            handle_announcement(new_message, data).await;
        }
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } => {
            handle_component(ctx, component, data).await?;
        }
        _ => {}
    }

    Ok(())
}

/// Keep only the newest webhook announcement in the configured channel
async fn handle_announcement(msg: &Message, data: &Data) {
    let Some(channel_id) = data.config.discord.announcement_channel_id else {
        return;
    };
    if msg.channel_id.get() != channel_id || msg.webhook_id.is_none() {
        return;
    }

    let anchor = Anchor::new(channel_id, msg.id.get());
    if let Some(previous) = data
        .announcements
        .replace(anchor, data.messenger.as_ref())
        .await
    {
        debug!(
            previous = previous.message_id,
            latest = anchor.message_id,
            "Announcement superseded"
        );
    }
}

/// Route a button click to its session
async fn handle_component(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &Data,
) -> Result<()> {
    let Some((action, session)) = parse_custom_id(&component.data.custom_id) else {
        debug!("Ignoring unknown component: {}", component.data.custom_id);
        return Ok(());
    };

    // Session updates go through the message itself; just acknowledge the click
    component
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await?;

    let actor = ActorId(component.user.id.get());
    let result = match action {
        ControlAction::Reroll => {
            let rolled_by = match &component.member {
                Some(member) => member.display_name().to_string(),
                None => component.user.display_name().to_string(),
            };
            data.coordinator
                .reroll(session, &rolled_by)
                .await
                .map(|_| ())
        }
        ControlAction::Draw => data.coordinator.draw(session, actor).await.map(|_| ()),
        ControlAction::Cancel => data.coordinator.cancel(session, actor).await.map(|_| ()),
    };

    let Err(err) = result else {
        return Ok(());
    };

    match err.kind() {
        ErrorKind::Authorization | ErrorKind::Lifecycle | ErrorKind::Validation => {
            debug!(session = %session, actor = %actor, "Rejected {:?}: {}", action, err);
        }
        _ => error!(session = %session, "{:?} failed: {}", action, err),
    }

    // Only the clicking user sees why nothing happened
    if let Err(e) = component
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(err.user_notice())
                .ephemeral(true),
        )
        .await
    {
        warn!("Failed to send ephemeral notice: {:?}", e);
    }

    Ok(())
}
