//! /poll command - Reaction poll with lettered options (poise implementation)

use poise::CreateReply;
use poise::serenity_prelude::{Colour, CreateEmbed, CreateEmbedFooter, ReactionType};
use tracing::{info, warn};

use cb_core::poll::{parse_options, with_markers};

use crate::commands::{Context, display_name, report_failure};
use crate::error::Result;

/// Create a poll with multiple options
#[poise::command(slash_command, rename = "poll")]
pub async fn poll(
    ctx: Context<'_>,
    #[description = "Poll question"] question: String,
    #[description = "Options separated by commas, e.g. Yes, No, Maybe"] options: String,
) -> Result<()> {
    let options = match parse_options(&options) {
        Ok(options) => options,
        Err(e) => return report_failure(ctx, &e).await,
    };

    info!("Processing /poll with {} options: {}", options.len(), question);

    let description = with_markers(&options)
        .map(|(marker, option)| format!("{} {}", marker, option))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = CreateEmbed::new()
        .title(format!("📊 {}", question))
        .description(description)
        .colour(Colour::BLURPLE)
        .footer(CreateEmbedFooter::new(format!(
            "Started by {}",
            display_name(ctx).await
        )));

    let handle = ctx.send(CreateReply::default().embed(embed)).await?;
    let message = handle.message().await?;

    for (marker, _) in with_markers(&options) {
        if let Err(e) = message
            .react(ctx.http(), ReactionType::Unicode(marker.to_string()))
            .await
        {
            warn!("Failed to add poll option {}: {:?}", marker, e);
            break;
        }
    }

    Ok(())
}
