//! Registering command definitions with the API.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::BotError;
use crate::rest::RestClient;

/// Commands the bot knows how to answer.
pub const ACCEPTED_COMMANDS: [&str; 5] = ["ping", "avatar", "banner", "choose", "order"];

/// POST `<dir>/<name>.json` for each accepted name. Unknown names are skipped.
///
/// Returns how many commands were registered.
pub async fn define_commands(
    rest: &RestClient,
    application_id: u64,
    dir: impl AsRef<Path>,
    names: &[String],
) -> Result<usize, BotError> {
    let dir = dir.as_ref();
    let mut registered = 0;

    for name in names {
        if !ACCEPTED_COMMANDS.contains(&name.as_str()) {
            info!(command = %name, "skipping unknown command");
            continue;
        }

        let file = dir.join(format!("{name}.json"));
        let content = tokio::fs::read_to_string(&file).await.map_err(|e| {
            BotError::Config(format!("failed to read {}: {e}", file.display()))
        })?;
        let definition: Value = serde_json::from_str(&content).map_err(|e| {
            BotError::Config(format!("invalid command definition {}: {e}", file.display()))
        })?;

        rest.register_command(application_id, &definition).await?;
        info!(command = %name, "registered command");
        registered += 1;
    }

    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_registers_known_commands_only() {
        let dir = tempfile::tempdir().unwrap();
        let ping = json!({"name": "ping", "description": "Pong!", "type": 1});
        std::fs::write(dir.path().join("ping.json"), ping.to_string()).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/applications/42/commands"))
            .and(body_json(&ping))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let rest = RestClient::new(server.uri(), "t0k").unwrap();
        let names = vec!["ping".to_string(), "fe8".to_string()];
        let count = define_commands(&rest, 42, dir.path(), &names).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_missing_definition_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let rest = RestClient::new("http://127.0.0.1:9", "t0k").unwrap();
        let result = define_commands(&rest, 42, dir.path(), &["order".to_string()]).await;
        assert!(matches!(result, Err(BotError::Config(_))));
    }

    #[test]
    fn test_shipped_definitions_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../commands/def");
        for name in ACCEPTED_COMMANDS {
            let content = std::fs::read_to_string(dir.join(format!("{name}.json"))).unwrap();
            let definition: Value = serde_json::from_str(&content).unwrap();
            assert_eq!(definition["name"], name);
        }
    }
}
