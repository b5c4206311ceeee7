//! Wiring the gateway, the REST client and the command responder together.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::{spawn_responder, INTERACTION_BUFFER};
use crate::config::{BotConfig, Credentials};
use crate::error::BotError;
use crate::gateway::{GatewayIdentity, GatewaySupervisor};
use crate::rest::{resolve_gateway, RestClient};

/// Build the gateway identity from config and credentials.
#[must_use]
pub fn identity(config: &BotConfig, credentials: &Credentials) -> GatewayIdentity {
    GatewayIdentity {
        token: credentials.token.clone(),
        intents: config.intents,
        properties: config.properties.clone(),
    }
}

/// Run the bot until `shutdown` is cancelled.
pub async fn run(
    config: &BotConfig,
    credentials: &Credentials,
    shutdown: CancellationToken,
) -> Result<(), BotError> {
    let rest = RestClient::new(&config.api_base, &credentials.token)?;
    let url = resolve_gateway(
        &rest,
        config.lookup_gateway,
        &config.fallback_gateway_url,
        config.api_version,
    )
    .await?;
    info!(url = %url, "resolved gateway");

    let (tx, rx) = mpsc::channel(INTERACTION_BUFFER);
    let responder = spawn_responder(rest, rx);

    let supervisor = GatewaySupervisor::new(url, identity(config, credentials))
        .with_dial_backoff((&config.reconnect).into())
        .with_close_timeout(config.close_timeout())
        .with_interaction_handler(tx);

    let result = supervisor.run(shutdown).await;
    drop(supervisor);

    if let Err(e) = responder.await {
        warn!(error = %e, "responder task panicked");
    }
    result
}
