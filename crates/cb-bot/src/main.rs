//! chobot: community Discord bot
//!
//! Usage:
//!   chobot           - Connect to Discord and serve slash commands
//!   chobot --help    - Show help
//!   chobot --version - Show version

use cb_core::Config;
use cb_discord::DiscordBot;
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Connect and serve
    Bot,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("chobot {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Bot => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load ini.env (legacy name) and .env
    dotenvy::from_filename("ini.env").ok();
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting chobot...");
    match config.discord.guild_id {
        Some(guild_id) => tracing::info!("Commands scoped to guild {}", guild_id),
        None => tracing::info!("Commands registered globally"),
    }
    if config.discord.announcement_channel_id.is_none() {
        tracing::info!("Announcement dedup disabled (no channel configured)");
    }

    let bot = DiscordBot::new(config);
    let mut handle = tokio::spawn(async move {
        if let Err(e) = bot.start().await {
            tracing::error!("Discord bot error: {}", e);
        }
    });

    let bot_task = handle.abort_handle();

    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down...");
            bot_task.abort();
        }
        _ = &mut handle => {
            tracing::warn!("Discord bot stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Bot
}

/// Print help message
fn print_help() {
    println!("chobot - community Discord bot");
    println!();
    println!("Usage:");
    println!("  chobot           Connect to Discord and serve slash commands");
    println!("  chobot --help    Show this help message");
    println!("  chobot --version Show version");
    println!();
    println!("Configuration is read from ./chobot.toml when present.");
    println!();
    println!("Environment Variables:");
    println!("  DISCORD_BOT_TOKEN        Discord bot token (required)");
    println!("  DISCORD_GUILD_ID         Guild to register commands in (default: global)");
    println!("  ANNOUNCEMENT_CHANNEL_ID  Channel whose webhook posts are deduplicated");
    println!("  INVITE_URL               Link sent by /invite");
    println!("  INVITE_IMAGE_URL         Image shown by /invite");
    println!("  RUST_LOG                 Log filter (default: info)");
}
