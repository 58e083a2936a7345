//! /raffle command - Draw a winner among the users who react (poise implementation)

use tracing::info;

use cb_core::{ActorId, RaffleSpec};

use crate::commands::{Context, report_failure};
use crate::error::Result;

/// Start a raffle among everyone who reacts to the message
#[poise::command(slash_command, rename = "raffle")]
pub async fn raffle(
    ctx: Context<'_>,
    #[description = "Raffle name"] label: String,
    #[description = "Seconds to react (5-300, default 30)"] window: Option<u64>,
    #[description = "Emoji to react with (default 🎉)"] marker: Option<String>,
) -> Result<()> {
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let spec = RaffleSpec {
        label,
        marker: marker.unwrap_or_else(|| data.config.sessions.raffle_default_marker.clone()),
        window_secs: window.unwrap_or(data.config.sessions.raffle_default_window_secs),
        owner: ActorId(ctx.author().id.get()),
    };

    match data
        .coordinator
        .start_raffle(ctx.channel_id().get(), spec)
        .await
    {
        Ok(session) => {
            info!(session = %session, owner = %ctx.author().id, "Processing /raffle");
            ctx.say("Raffle started. Use the buttons on it to draw or cancel.")
                .await?;
        }
        Err(e) => report_failure(ctx, &e).await?,
    }

    Ok(())
}
