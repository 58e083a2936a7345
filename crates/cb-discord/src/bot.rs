//! Discord Bot implementation using poise on Serenity

use anyhow::Result;
use poise::serenity_prelude::{self as serenity, GatewayIntents, GuildId};
use tracing::{error, info};

use cb_core::Config;

use crate::commands::{self, Data, Error};
use crate::error::DiscordError;
use crate::handler;

/// Discord Bot for chobot
pub struct DiscordBot {
    config: Config,
}

impl DiscordBot {
    /// Create a new Discord Bot instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the Discord bot
    pub async fn start(&self) -> Result<()> {
        let token = self
            .config
            .discord
            .token
            .clone()
            .ok_or(DiscordError::TokenNotSet)?;

        // - GUILDS: Slash commands and component interactions
        // - GUILD_MESSAGES: Webhook announcements to deduplicate
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;

        info!("Starting Discord bot...");

        let config = self.config.clone();
        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                commands: commands::get_commands(),
                event_handler: |ctx, event, framework, data| {
                    Box::pin(handler::event_handler(ctx, event, framework, data))
                },
                on_error: |error| Box::pin(on_error(error)),
                ..Default::default()
            })
            .setup(move |ctx, _ready, framework| {
                Box::pin(async move {
                    let commands = &framework.options().commands;
                    let registered = match config.discord.guild_id {
                        Some(guild_id) => {
                            poise::builtins::register_in_guild(ctx, commands, GuildId::new(guild_id))
                                .await
                        }
                        None => poise::builtins::register_globally(ctx, commands).await,
                    };
                    match registered {
                        Ok(()) => info!("Registered {} slash commands", commands.len()),
                        Err(e) => error!("Failed to register slash commands: {}", e),
                    }

                    Ok(Data::new(ctx.http.clone(), config))
                })
            })
            .build();

        // Build and start the client
        let mut client = serenity::ClientBuilder::new(token, intents)
            .framework(framework)
            .await?;

        // Start listening for events
        client.start().await?;

        Ok(())
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(command = %ctx.command().name, "Command failed: {}", error);
            let reply = poise::CreateReply::default()
                .content("Something went wrong, please try again.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to report command error: {:?}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(event = event.snake_case_name(), "Event handler failed: {}", error);
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {:?}", e);
            }
        }
    }
}
