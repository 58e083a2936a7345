//! /help command - List the bot's commands (poise implementation)

use poise::CreateReply;
use poise::serenity_prelude::{Colour, CreateEmbed};

use crate::commands::Context;
use crate::error::Result;

const COMMANDS: [(&str, &str); 5] = [
    ("/help", "Shows this command list"),
    ("/invite", "Sends an invite link to the server"),
    ("/roll", "Rolls dice in NdM form (e.g. 4d6)"),
    ("/poll", "Creates a poll with multiple options"),
    (
        "/raffle",
        "Starts a reaction raffle with a custom time and emoji",
    ),
];

/// Show the list of available commands
#[poise::command(slash_command, rename = "help")]
pub async fn help(ctx: Context<'_>) -> Result<()> {
    let embed = COMMANDS.iter().fold(
        CreateEmbed::new()
            .title("📋 Available commands")
            .colour(Colour::from_rgb(254, 231, 92)),
        |embed, (name, description)| embed.field(*name, *description, false),
    );

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
