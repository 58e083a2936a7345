//! cb-discord: Discord front end for chobot
//!
//! Slash commands, button dispatch into the session coordinator and the
//! Serenity-backed [`Messenger`](cb_core::Messenger).
//! Uses poise 0.6 on top of Serenity 0.12.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handler;
pub mod messenger;
pub mod render;

pub use bot::DiscordBot;
pub use error::{DiscordError, Result};
pub use messenger::SerenityMessenger;
