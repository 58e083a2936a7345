//! /invite command - Post the server invite (poise implementation)

use poise::CreateReply;
use poise::serenity_prelude::{Colour, CreateEmbed};

use crate::commands::Context;
use crate::error::Result;

/// Send an invite link to the server
#[poise::command(slash_command, rename = "invite")]
pub async fn invite(ctx: Context<'_>) -> Result<()> {
    let invite = &ctx.data().config.invite;

    let mut reply = CreateReply::default().content(invite.url.clone());
    if let Some(image_url) = &invite.image_url {
        reply = reply.embed(
            CreateEmbed::new()
                .colour(Colour::DARK_GREY)
                .image(image_url.clone()),
        );
    }

    ctx.send(reply).await?;

    Ok(())
}
