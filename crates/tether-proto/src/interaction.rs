//! Application command interactions and their replies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Interaction data type of a slash command.
pub const CHAT_INPUT: u8 = 1;
/// Reply type: send a channel message in response to the command.
pub const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;

/// A user account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Snowflake id.
    pub id: String,
    /// Account name.
    pub username: String,
    /// Legacy four-digit discriminator.
    #[serde(default)]
    pub discriminator: String,
    /// Avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Profile banner hash. Only filled in by the REST user lookup.
    #[serde(default)]
    pub banner: Option<String>,
}

impl User {
    /// `username#discriminator`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildMember {
    /// The member's user account.
    #[serde(default)]
    pub user: Option<User>,
    /// Guild-specific avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Users and members referenced by command options, keyed by user id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedEntities {
    /// Resolved users.
    #[serde(default)]
    pub users: HashMap<String, User>,
    /// Resolved guild members.
    #[serde(default)]
    pub members: HashMap<String, GuildMember>,
}

/// One option (argument) passed to a command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandOption {
    /// Option name.
    pub name: String,
    /// Option type.
    #[serde(rename = "type", default)]
    pub kind: u8,
    /// Option value, absent for sub-command groups.
    #[serde(default)]
    pub value: Option<Value>,
    /// Nested options of a sub-command.
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    /// The value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    /// The value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(Value::as_bool)
    }
}

/// The command invocation inside an interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InteractionData {
    /// Command id.
    #[serde(default)]
    pub id: String,
    /// Command name.
    pub name: String,
    /// Command type; [`CHAT_INPUT`] for slash commands.
    #[serde(rename = "type", default)]
    pub kind: u8,
    /// Arguments.
    #[serde(default)]
    pub options: Vec<CommandOption>,
    /// Entities referenced by the arguments.
    #[serde(default)]
    pub resolved: ResolvedEntities,
}

/// Payload of an `INTERACTION_CREATE` dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Interaction id, used in the callback URL.
    pub id: String,
    /// Continuation token, used in the callback URL.
    pub token: String,
    /// Interaction type.
    #[serde(rename = "type", default)]
    pub kind: u8,
    /// Guild the command was invoked in.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Invoking member, for guild invocations.
    #[serde(default)]
    pub member: Option<GuildMember>,
    /// Invoking user, for direct-message invocations.
    #[serde(default)]
    pub user: Option<User>,
    /// Command data.
    #[serde(default)]
    pub data: Option<InteractionData>,
}

impl Interaction {
    /// Name of the invoked command, if any.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.name.as_str())
    }

    /// The invoking user, taken from the member when present.
    #[must_use]
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

/// Image attached to an embed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedImage {
    /// Image URL.
    pub url: String,
}

/// Rich embed in a reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Embed {
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link target of the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Large image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
}

/// Message body of a reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionCallbackData {
    /// Plain text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Embeds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// Reply posted to the interaction callback endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionResponse {
    /// Reply type.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Message body.
    pub data: InteractionCallbackData,
}

impl InteractionResponse {
    /// A plain text channel message.
    #[must_use]
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: InteractionCallbackData {
                content: Some(content.into()),
                embeds: Vec::new(),
            },
        }
    }

    /// A channel message with a single image embed.
    #[must_use]
    pub fn image_embed(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: InteractionCallbackData {
                content: None,
                embeds: vec![Embed {
                    title: Some(title.into()),
                    description: None,
                    url: Some(url.clone()),
                    image: Some(EmbedImage { url }),
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guild_interaction() -> Interaction {
        serde_json::from_value(json!({
            "id": "1001",
            "token": "abc",
            "type": 2,
            "guild_id": "55",
            "member": {
                "user": {"id": "7", "username": "panda", "discriminator": "0420", "avatar": "a_hash"},
                "avatar": null
            },
            "data": {
                "id": "3",
                "name": "choose",
                "type": 1,
                "options": [
                    {"name": "first", "type": 3, "value": "tea"},
                    {"name": "second", "type": 3, "value": "coffee"}
                ]
            }
        }))
        .expect("valid interaction")
    }

    #[test]
    fn test_interaction_accessors() {
        let interaction = guild_interaction();
        assert_eq!(interaction.command_name(), Some("choose"));
        let invoker = interaction.invoker().expect("invoker");
        assert_eq!(invoker.tag(), "panda#0420");

        let data = interaction.data.expect("data");
        assert_eq!(data.kind, CHAT_INPUT);
        assert_eq!(data.options[1].as_str(), Some("coffee"));
        assert!(data.resolved.users.is_empty());
    }

    #[test]
    fn test_invoker_falls_back_to_user() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "1",
            "token": "t",
            "user": {"id": "9", "username": "dm-user"}
        }))
        .expect("valid interaction");

        assert_eq!(interaction.invoker().map(|u| u.id.as_str()), Some("9"));
        assert_eq!(interaction.command_name(), None);
    }

    #[test]
    fn test_option_value_accessors() {
        let option = CommandOption {
            name: "show_server_profile".to_string(),
            kind: 5,
            value: Some(json!(false)),
            options: Vec::new(),
        };
        assert_eq!(option.as_bool(), Some(false));
        assert_eq!(option.as_str(), None);
    }

    #[test]
    fn test_message_response_shape() {
        let json = serde_json::to_value(InteractionResponse::message("Pong")).expect("serialize");
        assert_eq!(json, json!({"type": 4, "data": {"content": "Pong"}}));
    }

    #[test]
    fn test_image_embed_response_shape() {
        let json = serde_json::to_value(InteractionResponse::image_embed(
            "Avatar for panda#0420",
            "https://cdn.example/a.png",
        ))
        .expect("serialize");

        assert_eq!(
            json,
            json!({
                "type": 4,
                "data": {
                    "embeds": [{
                        "title": "Avatar for panda#0420",
                        "url": "https://cdn.example/a.png",
                        "image": {"url": "https://cdn.example/a.png"}
                    }]
                }
            })
        );
    }
}
