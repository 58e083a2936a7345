//! Configuration management
//!
//! Configuration is resolved in this order:
//! 1. Environment variables
//! 2. `chobot.toml`
//! 3. Default values
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::session::raffle::{MAX_WINDOW_SECS, MIN_WINDOW_SECS};
use crate::{Error, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chobot.toml";

/// Discord connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Guild the slash commands are registered in (global when unset)
    pub guild_id: Option<u64>,

    /// Channel whose webhook announcements are deduplicated
    pub announcement_channel_id: Option<u64>,
}

/// `/invite` content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteConfig {
    #[serde(default = "default_invite_url")]
    pub url: String,

    #[serde(default = "default_invite_image_url")]
    pub image_url: Option<String>,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            url: default_invite_url(),
            image_url: default_invite_image_url(),
        }
    }
}

/// Timing and defaults of interactive sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long the reroll button stays active
    #[serde(default = "default_reroll_window")]
    pub reroll_window_secs: u64,

    /// Raffle window when the command omits it
    #[serde(default = "default_raffle_window")]
    pub raffle_default_window_secs: u64,

    /// Raffle marker when the command omits it
    #[serde(default = "default_raffle_marker")]
    pub raffle_default_marker: String,

    /// How long finished sessions still answer late clicks
    #[serde(default = "default_finished_retention")]
    pub finished_retention_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reroll_window_secs: default_reroll_window(),
            raffle_default_window_secs: default_raffle_window(),
            raffle_default_marker: default_raffle_marker(),
            finished_retention_secs: default_finished_retention(),
        }
    }
}

fn default_invite_url() -> String {
    "https://discord.gg/D48QWY6MhK".to_string()
}

fn default_invite_image_url() -> Option<String> {
    Some("https://i.ibb.co/fn7VvQZ/welcome.gif".to_string())
}

fn default_reroll_window() -> u64 {
    15
}

fn default_raffle_window() -> u64 {
    30
}

fn default_raffle_marker() -> String {
    "🎉".to_string()
}

fn default_finished_retention() -> u64 {
    600
}

/// Main configuration for chobot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub invite: InviteConfig,

    #[serde(default)]
    pub sessions: SessionConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` from the environment; unknown variables become empty
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse TOML content (after env expansion) and apply env overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);
        let mut config: Config = toml::from_str(&expanded)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load `chobot.toml` when present, otherwise the environment only
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("DISCORD_BOT_TOKEN") {
            if !token.is_empty() {
                self.discord.token = Some(token);
            }
        }
        if let Some(id) = env_u64("DISCORD_GUILD_ID") {
            self.discord.guild_id = Some(id);
        }
        if let Some(id) = env_u64("ANNOUNCEMENT_CHANNEL_ID") {
            self.discord.announcement_channel_id = Some(id);
        }

        if let Ok(url) = std::env::var("INVITE_URL") {
            if !url.is_empty() {
                self.invite.url = url;
            }
        }
        if let Ok(url) = std::env::var("INVITE_IMAGE_URL") {
            if !url.is_empty() {
                self.invite.image_url = Some(url);
            }
        }
    }

    /// Check values that would only fail later at runtime
    pub fn validate(&self) -> Result<()> {
        if self
            .discord
            .token
            .as_deref()
            .is_none_or(|token| token.trim().is_empty())
        {
            return Err(Error::Config("DISCORD_BOT_TOKEN not set".to_string()));
        }

        let window = self.sessions.raffle_default_window_secs;
        if !(MIN_WINDOW_SECS..=MAX_WINDOW_SECS).contains(&window) {
            return Err(Error::Config(format!(
                "sessions.raffle_default_window_secs must be within {}..={}, got {}",
                MIN_WINDOW_SECS, MAX_WINDOW_SECS, window
            )));
        }

        if self.sessions.reroll_window_secs == 0 {
            return Err(Error::Config(
                "sessions.reroll_window_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
