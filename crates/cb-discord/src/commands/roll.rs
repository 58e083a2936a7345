//! /roll command - Roll dice with a shared reroll button (poise implementation)

use tracing::info;

use crate::commands::{Context, display_name, report_failure};
use crate::error::Result;

/// Roll dice in NdM form (e.g. 4d6)
#[poise::command(slash_command, rename = "roll")]
pub async fn roll(
    ctx: Context<'_>,
    #[description = "Dice in NdM form, e.g. 4d6"] dice: String,
) -> Result<()> {
    // The roll itself is posted to the channel; this reply only acknowledges
    ctx.defer_ephemeral().await?;

    let rolled_by = display_name(ctx).await;
    let channel_id = ctx.channel_id().get();

    match ctx
        .data()
        .coordinator
        .start_roll(channel_id, &dice, &rolled_by)
        .await
    {
        Ok((session, result)) => {
            info!(session = %session, user = %ctx.author().id, "Processing /roll {}", dice);
            ctx.say(format!("🎲 Rolled {} for a total of {}", dice, result.total))
                .await?;
        }
        Err(e) => report_failure(ctx, &e).await?,
    }

    Ok(())
}
