//! Bot configuration.
//!
//! Configuration for the tether client, including:
//! - REST API and gateway endpoints
//! - Paths of the secret files holding the token and application id
//! - Identify properties and intents
//! - Dial retry and shutdown timing

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_proto::ConnectionProperties;

use crate::error::BotError;
use crate::gateway::DialBackoff;

/// Dial retry settings as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReconnectSettings {
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for the retry delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied per failed attempt.
    pub backoff_multiplier: f64,
    /// Give up after this many consecutive dial failures (unset = never).
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl From<&ReconnectSettings> for DialBackoff {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            first_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            factor: settings.backoff_multiplier,
            give_up_after: settings.max_attempts,
        }
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

const fn default_api_version() -> u8 {
    10
}

fn default_fallback_gateway_url() -> String {
    "wss://gateway.discord.gg".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_token_file() -> PathBuf {
    PathBuf::from("secret/token")
}

fn default_application_file() -> PathBuf {
    PathBuf::from("secret/application")
}

const fn default_close_timeout_ms() -> u64 {
    1_000
}

fn default_commands_dir() -> PathBuf {
    PathBuf::from("commands/def")
}

/// Main bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotConfig {
    /// Base URL of the REST API, including the version segment.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Gateway protocol version appended to the socket URL.
    #[serde(default = "default_api_version")]
    pub api_version: u8,
    /// Gateway URL used when the REST lookup is disabled or fails.
    #[serde(default = "default_fallback_gateway_url")]
    pub fallback_gateway_url: String,
    /// Ask the REST API for the current gateway URL before connecting.
    #[serde(default = "default_true")]
    pub lookup_gateway: bool,
    /// File holding the bot token.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// File holding the numeric application id.
    #[serde(default = "default_application_file")]
    pub application_file: PathBuf,
    /// Gateway intents bitfield sent with identify.
    #[serde(default)]
    pub intents: u64,
    /// How long to wait for the server's close acknowledgement on shutdown.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    /// Directory with one `<name>.json` command definition per command.
    #[serde(default = "default_commands_dir")]
    pub commands_dir: PathBuf,
    /// Client description sent with identify.
    #[serde(default)]
    pub properties: ConnectionProperties,
    /// Dial retry behavior.
    #[serde(default)]
    pub reconnect: ReconnectSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_version: default_api_version(),
            fallback_gateway_url: default_fallback_gateway_url(),
            lookup_gateway: true,
            token_file: default_token_file(),
            application_file: default_application_file(),
            intents: 0,
            close_timeout_ms: default_close_timeout_ms(),
            commands_dir: default_commands_dir(),
            properties: ConnectionProperties::default(),
            reconnect: ReconnectSettings::default(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BotError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, BotError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| BotError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BotError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BotError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), BotError> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(BotError::Config(
                "api_base must start with http:// or https://".to_string(),
            ));
        }

        if !self.fallback_gateway_url.starts_with("ws://")
            && !self.fallback_gateway_url.starts_with("wss://")
        {
            return Err(BotError::Config(
                "fallback_gateway_url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.reconnect.backoff_multiplier < 1.0 {
            return Err(BotError::Config(
                "reconnect.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }

        if self.reconnect.initial_delay_ms > self.reconnect.max_delay_ms {
            return Err(BotError::Config(
                "reconnect.initial_delay_ms cannot exceed reconnect.max_delay_ms".to_string(),
            ));
        }

        if self.reconnect.max_attempts == Some(0) {
            return Err(BotError::Config(
                "reconnect.max_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Graceful close wait as a duration.
    #[must_use]
    pub const fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

/// Bot token and application id, fixed for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bot token.
    pub token: String,
    /// Application id used for command registration.
    pub application_id: u64,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("application_id", &self.application_id)
            .finish()
    }
}

impl Credentials {
    /// Read the token and application id from the secret files named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing, empty, or the id is not numeric.
    pub fn load(config: &BotConfig) -> Result<Self, BotError> {
        let token = read_secret(&config.token_file)?;
        let application = read_secret(&config.application_file)?;
        let application_id = application.parse::<u64>().map_err(|e| {
            BotError::Config(format!(
                "application id in '{}' is not a number: {e}",
                config.application_file.display()
            ))
        })?;

        Ok(Self {
            token,
            application_id,
        })
    }
}

fn read_secret(path: &Path) -> Result<String, BotError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        BotError::Config(format!("failed to read '{}': {}", path.display(), e))
    })?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(BotError::Config(format!("'{}' is empty", path.display())));
    }
    Ok(value.to_string())
}
