//! Mapping of session views onto Discord messages

use poise::serenity_prelude::{
    ButtonStyle, Colour, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
    CreateMessage, EditMessage,
};

use cb_core::{RollResult, SessionId, View};

/// Buttons a session message can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Reroll,
    Draw,
    Cancel,
}

impl ControlAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Reroll => "reroll",
            Self::Draw => "draw",
            Self::Cancel => "cancel",
        }
    }

    /// Component id routing a click back to `session`
    pub fn custom_id(&self, session: SessionId) -> String {
        format!("{}:{}", self.as_str(), session)
    }
}

/// Split a component id into its action and session
pub fn parse_custom_id(custom_id: &str) -> Option<(ControlAction, SessionId)> {
    let (action, session) = custom_id.split_once(':')?;
    let action = match action {
        "reroll" => ControlAction::Reroll,
        "draw" => ControlAction::Draw,
        "cancel" => ControlAction::Cancel,
        _ => return None,
    };
    let session = SessionId::parse_str(session).ok()?;
    Some((action, session))
}

/// A view rendered into Discord message parts
pub struct Rendered {
    content: Option<String>,
    embed: Option<CreateEmbed>,
    components: Vec<CreateActionRow>,
}

impl Rendered {
    pub fn into_create_message(self) -> CreateMessage {
        let mut message = CreateMessage::new().components(self.components);
        if let Some(content) = self.content {
            message = message.content(content);
        }
        if let Some(embed) = self.embed {
            message = message.embed(embed);
        }
        message
    }

    /// Full replacement: parts absent from the view are cleared
    pub fn into_edit_message(self) -> EditMessage {
        EditMessage::new()
            .content(self.content.unwrap_or_default())
            .embeds(self.embed.into_iter().collect())
            .components(self.components)
    }
}

pub fn render(view: &View) -> Rendered {
    match view {
        View::Roll {
            session,
            spec,
            result,
            rolled_by,
            reroll,
        } => {
            let embed = CreateEmbed::new()
                .title(format!("Roll {}", spec))
                .description(roll_description(result))
                .colour(Colour::ORANGE)
                .footer(CreateEmbedFooter::new(format!("Rolled by {}", rolled_by)));

            let components = if *reroll {
                vec![CreateActionRow::Buttons(vec![
                    CreateButton::new(ControlAction::Reroll.custom_id(*session))
                        .label("🎲 Roll again")
                        .style(ButtonStyle::Primary),
                ])]
            } else {
                Vec::new()
            };

            Rendered {
                content: None,
                embed: Some(embed),
                components,
            }
        }
        View::RaffleOpen {
            session, controls, ..
        } => {
            let components = if *controls {
                vec![CreateActionRow::Buttons(vec![
                    CreateButton::new(ControlAction::Draw.custom_id(*session))
                        .label("🎲 Draw")
                        .style(ButtonStyle::Success),
                    CreateButton::new(ControlAction::Cancel.custom_id(*session))
                        .label("🚫 Cancel")
                        .style(ButtonStyle::Danger),
                ])]
            } else {
                Vec::new()
            };

            Rendered {
                content: view_text(view),
                embed: None,
                components,
            }
        }
        _ => Rendered {
            content: view_text(view),
            embed: None,
            components: Vec::new(),
        },
    }
}

/// Plain message text of a view; rolls are embed-only
pub fn view_text(view: &View) -> Option<String> {
    let text = match view {
        View::Roll { .. } => return None,
        View::RaffleOpen {
            label,
            marker,
            window_secs,
            ..
        } => format!(
            "**{}**\nReact with  {}  to join!\nYou have {} seconds to react.",
            label, marker, window_secs
        ),
        View::RaffleWinner { label, winner } => {
            format!("🎉 The winner of **{}** is {}!", label, winner.mention())
        }
        View::RaffleNoParticipants { label } => {
            format!("Nobody reacted to join **{}**.", label)
        }
        View::RaffleCancelled { label } => format!("Raffle **{}** cancelled.", label),
    };
    Some(text)
}

pub fn roll_description(result: &RollResult) -> String {
    let values = result
        .values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Rolls: {}\nTotal: **{}**", values, result.total)
}
