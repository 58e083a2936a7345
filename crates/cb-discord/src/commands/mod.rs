//! Slash commands for Discord bot (poise implementation)

mod help;
mod invite;
mod poll;
mod raffle;
mod roll;

use std::sync::Arc;

use poise::CreateReply;
use poise::serenity_prelude::Http;
use tracing::error;

use cb_core::{AnnouncementTracker, Config, ErrorKind, SessionCoordinator};

use crate::messenger::SerenityMessenger;

/// User data stored and accessible in all command invocations
pub struct Data {
    pub coordinator: Arc<SessionCoordinator>,
    pub announcements: Arc<AnnouncementTracker>,
    pub messenger: Arc<SerenityMessenger>,
    pub config: Config,
}

impl Data {
    pub fn new(http: Arc<Http>, config: Config) -> Self {
        let messenger = Arc::new(SerenityMessenger::new(http));
        let coordinator = SessionCoordinator::new(messenger.clone(), config.sessions.clone());

        Self {
            coordinator,
            announcements: Arc::new(AnnouncementTracker::new()),
            messenger,
            config,
        }
    }
}

/// Error type for commands
pub type Error = crate::error::DiscordError;

pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Export commands for registration
pub use help::help;
pub use invite::invite;
pub use poll::poll;
pub use raffle::raffle;
pub use roll::roll;

/// Get all commands for registration
pub fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![help(), invite(), roll(), poll(), raffle()]
}

/// Name shown for the invoking user (guild nickname first)
async fn display_name(ctx: Context<'_>) -> String {
    match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => ctx.author().display_name().to_string(),
    }
}

/// Tell the invoking user why their command did nothing
async fn report_failure(ctx: Context<'_>, err: &cb_core::Error) -> crate::Result<()> {
    if !matches!(err.kind(), ErrorKind::Validation | ErrorKind::Authorization) {
        error!(command = %ctx.command().name, "Command failed: {}", err);
    }

    ctx.send(
        CreateReply::default()
            .content(err.user_notice())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
