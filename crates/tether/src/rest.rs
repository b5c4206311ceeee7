//! REST helpers: gateway lookup, command registration, user lookup and
//! interaction callbacks.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tether_proto::{InteractionResponse, User};
use tracing::{debug, warn};
use url::Url;

use crate::error::BotError;

/// Timeout applied to every REST request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GatewayInfo {
    url: String,
}

/// Thin REST client authenticated with a bot token.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base: String,
    token: String,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a client for the API rooted at `base`.
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Result<Self, BotError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tether/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Look up the WebSocket URL to dial.
    pub async fn gateway_url(&self) -> Result<String, BotError> {
        let response = self
            .http
            .get(self.endpoint("/gateway"))
            .header("Authorization", self.authorization())
            .send()
            .await?;
        let info: GatewayInfo = check(response).await?.json().await?;
        Ok(info.url)
    }

    /// Register one application command from its JSON definition.
    pub async fn register_command(
        &self,
        application_id: u64,
        definition: &Value,
    ) -> Result<(), BotError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/applications/{application_id}/commands")))
            .header("Authorization", self.authorization())
            .json(definition)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Fetch a user, including the banner hash.
    pub async fn get_user(&self, user_id: &str) -> Result<User, BotError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/users/{user_id}")))
            .header("Authorization", self.authorization())
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Answer an interaction.
    pub async fn create_interaction_response(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        reply: &InteractionResponse,
    ) -> Result<(), BotError> {
        let response = self
            .http
            .post(self.endpoint(&format!(
                "/interactions/{interaction_id}/{interaction_token}/callback"
            )))
            .json(reply)
            .send()
            .await?;
        check(response).await?;
        debug!(interaction_id, "interaction answered");
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, BotError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BotError::Rest(format!("{status}: {body}")))
}

/// Append the protocol version and encoding to a gateway URL.
pub fn gateway_endpoint(base: &str, version: u8) -> Result<String, BotError> {
    let mut url = Url::parse(base)
        .map_err(|e| BotError::GatewayConnection(format!("invalid gateway url {base}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("v", &version.to_string())
        .append_pair("encoding", "json");
    Ok(url.into())
}

/// Resolve the gateway URL, falling back when the lookup is disabled or fails.
pub async fn resolve_gateway(
    rest: &RestClient,
    lookup: bool,
    fallback: &str,
    version: u8,
) -> Result<String, BotError> {
    let base = if lookup {
        match rest.gateway_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, fallback, "gateway lookup failed, using fallback");
                fallback.to_string()
            }
        }
    } else {
        fallback.to_string()
    };
    gateway_endpoint(&base, version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_gateway_endpoint_appends_query() {
        let url = gateway_endpoint("wss://gateway.discord.gg", 10).unwrap();
        assert_eq!(url, "wss://gateway.discord.gg/?v=10&encoding=json");
    }

    #[test]
    fn test_gateway_endpoint_rejects_garbage() {
        assert!(matches!(
            gateway_endpoint("not a url", 10),
            Err(BotError::GatewayConnection(_))
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = RestClient::new("https://example.test/api", "secret-token").unwrap();
        assert!(!format!("{client:?}").contains("secret-token"));
    }

    #[tokio::test]
    async fn test_gateway_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway"))
            .and(header("Authorization", "Bot t0k"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"url": "wss://gw.example"})),
            )
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "t0k").unwrap();
        assert_eq!(client.gateway_url().await.unwrap(), "wss://gw.example");
    }

    #[tokio::test]
    async fn test_resolve_gateway_falls_back_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "t0k").unwrap();
        let url = resolve_gateway(&client, true, "wss://fallback.example", 10)
            .await
            .unwrap();
        assert_eq!(url, "wss://fallback.example/?v=10&encoding=json");
    }

    #[tokio::test]
    async fn test_resolve_gateway_without_lookup() {
        let client = RestClient::new("http://127.0.0.1:9", "t0k").unwrap();
        let url = resolve_gateway(&client, false, "wss://fallback.example", 9)
            .await
            .unwrap();
        assert_eq!(url, "wss://fallback.example/?v=9&encoding=json");
    }

    #[tokio::test]
    async fn test_register_command_posts_definition() {
        let server = MockServer::start().await;
        let definition = json!({"name": "ping", "description": "Replies with Pong"});
        Mock::given(method("POST"))
            .and(path("/applications/42/commands"))
            .and(header("Authorization", "Bot t0k"))
            .and(body_json(&definition))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "t0k").unwrap();
        client.register_command(42, &definition).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/80"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "80",
                "username": "nelly",
                "discriminator": "1337",
                "avatar": null,
                "banner": "a_b4nn3r"
            })))
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "t0k").unwrap();
        let user = client.get_user("80").await.unwrap();
        assert_eq!(user.banner.as_deref(), Some("a_b4nn3r"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_rest_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/interactions/1/tok/callback"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad reply"))
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "t0k").unwrap();
        let err = client
            .create_interaction_response("1", "tok", &InteractionResponse::message("Pong"))
            .await
            .unwrap_err();
        match err {
            BotError::Rest(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("bad reply"));
            }
            other => panic!("expected rest error, got {other:?}"),
        }
    }
}
