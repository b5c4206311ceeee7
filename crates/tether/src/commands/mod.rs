//! Slash command handling.
//!
//! The gateway hands every interaction to [`spawn_responder`], which answers
//! each one on its own task so a slow REST call never holds up the read loop.

pub mod define;
pub mod reply;

use tether_proto::Interaction;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use define::{define_commands, ACCEPTED_COMMANDS};
pub use reply::{AvatarTarget, Command};

use crate::error::BotError;
use crate::rest::RestClient;

/// Capacity of the queue between the gateway and the responder.
pub const INTERACTION_BUFFER: usize = 64;

/// Answer one interaction.
pub async fn answer(rest: &RestClient, interaction: &Interaction) -> Result<(), BotError> {
    let command = Command::parse(interaction)?;
    debug!(interaction_id = %interaction.id, command = ?command, "answering command");

    let response = match command {
        Command::Ping => reply::ping(),
        Command::Avatar(target) => reply::avatar(&target),
        Command::Banner { user_id } => {
            let user = rest.get_user(&user_id).await?;
            reply::banner(&user)
        }
        Command::Choose(options) => {
            let mut rng = rand::thread_rng();
            reply::choose(&options, &mut rng)
        }
        Command::Order(options) => {
            let mut rng = rand::thread_rng();
            reply::order(options, &mut rng)
        }
    };

    rest.create_interaction_response(&interaction.id, &interaction.token, &response)
        .await
}

/// Consume interactions until every sender is dropped.
pub fn spawn_responder(rest: RestClient, mut rx: mpsc::Receiver<Interaction>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(interaction) = rx.recv().await {
            info!(
                interaction_id = %interaction.id,
                command = interaction.command_name().unwrap_or("<none>"),
                "received interaction"
            );
            let rest = rest.clone();
            tokio::spawn(async move {
                if let Err(e) = answer(&rest, &interaction).await {
                    warn!(interaction_id = %interaction.id, error = %e, "interaction not answered");
                }
            });
        }
        debug!("interaction channel closed");
    })
}
