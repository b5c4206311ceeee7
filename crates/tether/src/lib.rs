//! Tether: a gateway bot client.
//!
//! Keeps one WebSocket session to an event-streaming gateway alive:
//! identify or resume, heartbeats, reconnects. Slash command interactions
//! received over the gateway are answered through the REST API.
//!
//! ## Modules
//!
//! - [`gateway`]: connection supervisor, router, heartbeat, session state
//! - [`commands`]: command parsing, replies and registration
//! - [`rest`]: REST client
//! - [`config`]: TOML configuration and secrets
//! - [`bot`]: top-level wiring

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod rest;

pub use config::{BotConfig, Credentials};
pub use error::BotError;
pub use gateway::{ConnectionState, GatewayIdentity, GatewaySupervisor};
pub use rest::RestClient;
