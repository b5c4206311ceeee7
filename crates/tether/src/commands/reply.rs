//! Parsing slash command invocations and formatting their replies.

use rand::seq::SliceRandom;
use rand::Rng;
use tether_proto::interaction::CHAT_INPUT;
use tether_proto::{CommandOption, Interaction, InteractionResponse, User};

use crate::error::BotError;

const CDN: &str = "https://cdn.discordapp.com";

/// Who and what to show for the `avatar` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarTarget {
    /// Account whose avatar is shown.
    pub user: User,
    /// Guild the command ran in.
    pub guild_id: Option<String>,
    /// Guild-specific avatar hash.
    pub guild_avatar: Option<String>,
    /// Prefer the guild avatar over the account avatar.
    pub prefer_server: bool,
}

/// A recognised command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `ping`
    Ping,
    /// `avatar [user] [show_server_profile]`
    Avatar(AvatarTarget),
    /// `banner [user]`; the user is fetched over REST before replying.
    Banner {
        /// User to look up.
        user_id: String,
    },
    /// `choose a b ...`
    Choose(Vec<String>),
    /// `order a b ...`
    Order(Vec<String>),
}

fn rejected(msg: impl Into<String>) -> BotError {
    BotError::Command(msg.into())
}

fn option_text(option: &CommandOption) -> String {
    match (option.as_str(), &option.value) {
        (Some(s), _) => s.to_string(),
        (None, Some(value)) => value.to_string(),
        (None, None) => String::new(),
    }
}

fn at_least_two(options: &[CommandOption]) -> Result<Vec<String>, BotError> {
    if options.len() < 2 {
        return Err(rejected(format!(
            "expected at least 2 options, got {}",
            options.len()
        )));
    }
    Ok(options.iter().map(option_text).collect())
}

impl Command {
    /// Recognise the command carried by an interaction.
    pub fn parse(interaction: &Interaction) -> Result<Self, BotError> {
        let data = interaction
            .data
            .as_ref()
            .ok_or_else(|| rejected("interaction has no command data"))?;
        if data.kind != CHAT_INPUT {
            return Err(rejected(format!("unexpected command type {}", data.kind)));
        }

        match data.name.as_str() {
            "ping" => Ok(Self::Ping),
            "avatar" => {
                let mut user_option = None;
                let mut prefer_server = true;
                for option in &data.options {
                    match option.name.as_str() {
                        "user" => user_option = option.as_str(),
                        "show_server_profile" => {
                            prefer_server = option.as_bool().unwrap_or(true);
                        }
                        other => return Err(rejected(format!("unexpected avatar option {other}"))),
                    }
                }

                let (user, guild_avatar) = match user_option {
                    Some(id) => {
                        let user = data
                            .resolved
                            .users
                            .get(id)
                            .cloned()
                            .ok_or_else(|| rejected(format!("user {id} not resolved")))?;
                        let avatar = data.resolved.members.get(id).and_then(|m| m.avatar.clone());
                        (user, avatar)
                    }
                    None => {
                        let user = interaction
                            .invoker()
                            .cloned()
                            .ok_or_else(|| rejected("interaction has no invoker"))?;
                        let avatar = interaction.member.as_ref().and_then(|m| m.avatar.clone());
                        (user, avatar)
                    }
                };

                Ok(Self::Avatar(AvatarTarget {
                    user,
                    guild_id: interaction.guild_id.clone(),
                    guild_avatar,
                    prefer_server,
                }))
            }
            "banner" => {
                let user_id = match data.options.first() {
                    Some(option) if option.name == "user" => option
                        .as_str()
                        .ok_or_else(|| rejected("banner user option is not a string"))?
                        .to_string(),
                    Some(option) => {
                        return Err(rejected(format!("unexpected banner option {}", option.name)));
                    }
                    None => interaction
                        .invoker()
                        .map(|u| u.id.clone())
                        .ok_or_else(|| rejected("interaction has no invoker"))?,
                };
                Ok(Self::Banner { user_id })
            }
            "choose" => Ok(Self::Choose(at_least_two(&data.options)?)),
            "order" => Ok(Self::Order(at_least_two(&data.options)?)),
            other => Err(rejected(format!("unknown command {other}"))),
        }
    }
}

/// `gif` for animated hashes, `png` otherwise.
#[must_use]
pub fn image_extension(hash: &str) -> &'static str {
    if hash.starts_with("a_") { "gif" } else { "png" }
}

/// Reply to `ping`.
#[must_use]
pub fn ping() -> InteractionResponse {
    InteractionResponse::message("Pong")
}

/// Reply to `avatar`.
#[must_use]
pub fn avatar(target: &AvatarTarget) -> InteractionResponse {
    let user = &target.user;
    let title = format!("Avatar for {}", user.tag());

    let guild_url = match (&target.guild_id, &target.guild_avatar) {
        (Some(guild), Some(hash)) if target.prefer_server => Some(format!(
            "{CDN}/guilds/{guild}/users/{}/avatars/{hash}.{}?size=4096",
            user.id,
            image_extension(hash)
        )),
        _ => None,
    };

    let url = guild_url.or_else(|| {
        user.avatar.as_ref().map(|hash| {
            format!(
                "{CDN}/avatars/{}/{hash}.{}?size=4096",
                user.id,
                image_extension(hash)
            )
        })
    });

    match url {
        Some(url) => InteractionResponse::image_embed(title, url),
        None => InteractionResponse::message(format!("User {} has no avatar!", user.tag())),
    }
}

/// Reply to `banner` for a user fetched over REST.
#[must_use]
pub fn banner(user: &User) -> InteractionResponse {
    match &user.banner {
        Some(hash) => InteractionResponse::image_embed(
            format!("Banner for {}", user.tag()),
            format!(
                "{CDN}/banners/{}/{hash}.{}?size=4096",
                user.id,
                image_extension(hash)
            ),
        ),
        None => InteractionResponse::message(format!("User {} has no banner!", user.tag())),
    }
}

/// Reply to `choose`.
#[must_use]
pub fn choose<R: Rng + ?Sized>(options: &[String], rng: &mut R) -> InteractionResponse {
    let answer = options.choose(rng).map_or("", String::as_str);
    InteractionResponse::message(format!("The answer is {answer}"))
}

/// Reply to `order`.
#[must_use]
pub fn order<R: Rng + ?Sized>(mut options: Vec<String>, rng: &mut R) -> InteractionResponse {
    options.shuffle(rng);
    let mut content = String::from("The order is ");
    for option in &options {
        content.push('\n');
        content.push_str(option);
    }
    InteractionResponse::message(content)
}
